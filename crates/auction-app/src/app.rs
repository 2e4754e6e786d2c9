// Application orchestrator: owns the engine and database, turns operator
// commands into engine calls and persists the outcome.

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use auction_core::pool::{NewPlayer, PlayerEdit};
use auction_core::{AuctionEngine, AuctionError};

use crate::config::Config;
use crate::db::Database;
use crate::import::{self, ImportError};
use crate::protocol::{PoolEntry, PoolGroup, TeamSummary, UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Everything the application loop owns.
pub struct AppState {
    pub config: Config,
    pub engine: AuctionEngine,
    pub db: Database,
}

impl AppState {
    /// Build a fresh state: configured rules, category presets and teams,
    /// with an empty player pool.
    pub fn new(config: Config, db: Database) -> Self {
        let engine = configured_engine(&config);
        AppState { config, engine, db }
    }

    /// Write the current snapshot. Failures are logged and otherwise ignored;
    /// the in-memory state stays authoritative.
    pub fn persist(&self) {
        if let Err(e) = self.db.save_snapshot(&self.engine.serialize()) {
            warn!("Failed to persist auction snapshot: {:#}", e);
        }
    }

    /// Resolve an operator reference to a player id: exact id first, then a
    /// case-insensitive name.
    pub fn resolve_player(&self, reference: &str) -> Result<String, AuctionError> {
        let reference = reference.trim();
        let players = self.engine.players();
        players
            .iter()
            .find(|p| p.id == reference)
            .or_else(|| players.iter().find(|p| p.name.eq_ignore_ascii_case(reference)))
            .map(|p| p.id.clone())
            .ok_or_else(|| AuctionError::PlayerNotFound {
                player_id: reference.to_string(),
            })
    }

    /// Resolve an operator reference to a team id, as for players.
    pub fn resolve_team(&self, reference: &str) -> Result<String, AuctionError> {
        let reference = reference.trim();
        let teams = self.engine.teams();
        teams
            .iter()
            .find(|t| t.id == reference)
            .or_else(|| teams.iter().find(|t| t.name.eq_ignore_ascii_case(reference)))
            .map(|t| t.id.clone())
            .ok_or_else(|| AuctionError::UnknownTeam {
                team_id: reference.to_string(),
            })
    }

    /// Apply one command and return the updates to show. Rejections come
    /// back as `UiUpdate::Rejected`; state is unchanged in that case.
    pub fn handle_command(&mut self, cmd: UserCommand) -> Vec<UiUpdate> {
        match self.dispatch(cmd) {
            Ok(updates) => updates,
            Err(err) => {
                debug!("Rejected ({}): {}", err.kind(), err);
                vec![UiUpdate::Rejected(err)]
            }
        }
    }

    fn dispatch(&mut self, cmd: UserCommand) -> Result<Vec<UiUpdate>, AuctionError> {
        let updates = match cmd {
            UserCommand::ShowPool => vec![self.pool_update()],
            UserCommand::Send { player } => {
                let id = self.resolve_player(&player)?;
                self.engine.send_to_auction(&id)?;
                vec![self.round_update()]
            }
            UserCommand::Bid { team, amount } => {
                let team_id = self.resolve_team(&team)?;
                self.engine.place_bid_raw(&team_id, &amount)?;
                vec![self.round_update()]
            }
            UserCommand::Undo => match self.engine.reverse_bid() {
                Some(_) => vec![self.round_update()],
                None => vec![UiUpdate::Info("No bid to undo".into())],
            },
            UserCommand::Sold => {
                let sale = self.engine.finalize_sale()?;
                if let Err(e) = self.db.record_sale(&sale) {
                    warn!("Failed to record sale of {}: {:#}", sale.player_name, e);
                }
                self.persist();
                vec![UiUpdate::Sold(sale), self.teams_update()]
            }
            UserCommand::Unsold => {
                let receipt = self.engine.mark_unsold()?;
                self.persist();
                vec![UiUpdate::Unsold(receipt)]
            }
            UserCommand::Back => {
                self.engine.back();
                vec![UiUpdate::Info("Back to the pool".into())]
            }
            UserCommand::Results => {
                self.engine.show_results()?;
                vec![UiUpdate::Results {
                    teams: self.engine.teams().to_vec(),
                    unsold: self.engine.unsold_log().to_vec(),
                }]
            }
            UserCommand::Refund { target } => {
                let (team_id, player) = self.split_team_reference(&target)?;
                let player_id = self.resolve_roster_player(&team_id, player)?;
                let refund = self.engine.remove_player_from_team(&team_id, &player_id)?;
                self.persist();
                vec![UiUpdate::Refunded(refund), self.teams_update()]
            }
            UserCommand::AddPlayer {
                category,
                base_price,
                role,
                name,
            } => {
                let id = self.engine.add_player(NewPlayer {
                    name,
                    role,
                    category: Some(category),
                    base_price,
                    ..NewPlayer::default()
                });
                self.persist();
                vec![UiUpdate::Info(format!("Added player {id}"))]
            }
            UserCommand::EditBase { player, amount } => {
                let id = self.resolve_player(&player)?;
                self.engine.edit_player(
                    &id,
                    PlayerEdit {
                        base_price: Some(amount),
                        ..PlayerEdit::default()
                    },
                )?;
                self.persist();
                self.after_player_edit(&id)
            }
            UserCommand::ResetBase { player } => {
                let id = self.resolve_player(&player)?;
                self.engine.reset_base_to_category(&id)?;
                self.persist();
                self.after_player_edit(&id)
            }
            UserCommand::RemovePlayer { player } => {
                let id = self.resolve_player(&player)?;
                let removed = self.engine.remove_player(&id)?;
                self.persist();
                vec![UiUpdate::Info(format!("Removed {} from the pool", removed.name))]
            }
            UserCommand::AddTeam { name } => {
                let id = self.engine.add_team(&name);
                self.persist();
                vec![UiUpdate::Info(format!("Added team {id}")), self.teams_update()]
            }
            UserCommand::RemoveTeam { team } => {
                let id = self.resolve_team(&team)?;
                let removed = self.engine.remove_team(&id)?;
                self.persist();
                vec![
                    UiUpdate::Info(format!("Removed team {}", removed.name)),
                    self.teams_update(),
                ]
            }
            UserCommand::SetBase { category, amount } => {
                self.engine.set_category_base(category, amount);
                self.persist();
                vec![UiUpdate::Info(format!(
                    "{category} base price set to {amount} pts"
                ))]
            }
            UserCommand::ClearUnsold => {
                let count = self.engine.clear_unsold_log();
                self.persist();
                vec![UiUpdate::Info(format!("Cleared {count} unsold record(s)"))]
            }
            UserCommand::Reset { confirmed: false } => vec![UiUpdate::Info(
                "This deletes every player, team, sale and unsold record. \
                 Type `reset confirm` to proceed."
                    .into(),
            )],
            UserCommand::Reset { confirmed: true } => vec![self.reset()],
            UserCommand::Status => vec![self.round_update(), self.teams_update()],
            UserCommand::Help => vec![UiUpdate::Help],
            // Handled by the event loop.
            UserCommand::Quit => vec![],
        };
        Ok(updates)
    }

    /// Split `text` into a team and the player reference after it. The
    /// longest prefix naming a known team wins, so "Thunder Strikers Asha"
    /// resolves even when "Thunder" alone does not.
    fn split_team_reference<'a>(&self, text: &'a str) -> Result<(String, &'a str), AuctionError> {
        let text = text.trim();
        let cuts = text
            .char_indices()
            .filter(|(_, c)| c.is_whitespace())
            .map(|(i, _)| i)
            .rev();
        for cut in cuts {
            let (team, player) = text.split_at(cut);
            let player = player.trim();
            if player.is_empty() {
                continue;
            }
            if let Ok(team_id) = self.resolve_team(team) {
                return Ok((team_id, player));
            }
        }
        let first = text.split_whitespace().next().unwrap_or(text);
        Err(AuctionError::UnknownTeam {
            team_id: first.to_string(),
        })
    }

    /// Clear the database and rebuild the auction from config, re-importing
    /// the configured player pool.
    fn reset(&mut self) -> UiUpdate {
        if let Err(e) = self.db.clear_all() {
            warn!("Failed to clear the stored auction: {:#}", e);
            return UiUpdate::Info(format!("Reset failed: {e:#}"));
        }
        self.engine = configured_engine(&self.config);
        let imported = match self.config.player_pool.clone() {
            Some(pool) => seed_player_pool(self, Path::new(&pool)).unwrap_or_else(|e| {
                warn!("Failed to re-import player pool from {}: {}", pool, e);
                0
            }),
            None => 0,
        };
        self.persist();
        info!("Auction reset, {} player(s) imported", imported);
        UiUpdate::Info(format!(
            "Auction reset: {} team(s), {} player(s)",
            self.engine.teams().len(),
            imported
        ))
    }

    /// A roster reference may name a player no longer in the pool, so the
    /// team's own roster is searched before falling back to the pool.
    fn resolve_roster_player(&self, team_id: &str, reference: &str) -> Result<String, AuctionError> {
        let reference = reference.trim();
        let on_roster = self.engine.team(team_id).and_then(|team| {
            team.roster
                .iter()
                .find(|e| e.player.id == reference)
                .or_else(|| {
                    team.roster
                        .iter()
                        .find(|e| e.player.name.eq_ignore_ascii_case(reference))
                })
                .map(|e| e.player.id.clone())
        });
        match on_roster {
            Some(id) => Ok(id),
            None => self.resolve_player(reference),
        }
    }

    fn after_player_edit(&self, player_id: &str) -> Vec<UiUpdate> {
        let on_block = self
            .engine
            .round()
            .is_some_and(|r| r.player.id == player_id);
        if on_block {
            vec![self.round_update()]
        } else {
            let base = self.engine.player(player_id).map_or(0, |p| p.base_price);
            vec![UiUpdate::Info(format!(
                "Base price of {player_id} is now {base} pts"
            ))]
        }
    }

    fn round_update(&self) -> UiUpdate {
        UiUpdate::Round(Box::new(self.engine.round_snapshot()))
    }

    fn teams_update(&self) -> UiUpdate {
        UiUpdate::Teams(self.engine.teams().iter().map(TeamSummary::from).collect())
    }

    fn pool_update(&self) -> UiUpdate {
        let assignments = self.engine.assignments();
        let groups = self
            .engine
            .pool_by_category()
            .into_iter()
            .map(|(category, players)| PoolGroup {
                category,
                players: players
                    .into_iter()
                    .map(|p| PoolEntry {
                        id: p.id.clone(),
                        name: p.name.clone(),
                        role: p.role.clone(),
                        base_price: p.base_price,
                        owner: assignments.get(&p.id).cloned(),
                    })
                    .collect(),
            })
            .collect();
        UiUpdate::Pool(groups)
    }
}

/// Engine with the configured rules, category presets and teams, and an
/// empty player pool.
fn configured_engine(config: &Config) -> AuctionEngine {
    let mut engine = AuctionEngine::new(config.rules);
    for (category, base) in config.category_base.iter() {
        engine.set_category_base(category, base);
    }
    for name in &config.team_names {
        engine.add_team(name);
    }
    engine
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application loop until `Quit`, Ctrl+C, or the command channel
/// closes. Updates for each command are pushed through `ui_tx` in order.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        debug!("Command: {:?}", cmd);
                        for update in state.handle_command(cmd) {
                            let _ = ui_tx.send(update).await;
                        }
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            _ = &mut ctrl_c => {
                info!("Interrupt received, shutting down");
                break;
            }
        }
    }

    state.persist();
    info!("Application event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Startup: recovery and seeding
// ---------------------------------------------------------------------------

/// Restore the engine from the stored snapshot, if there is one.
///
/// Returns `Ok(false)` on a fresh database, leaving the configured state in
/// place. A snapshot that no longer parses is treated the same way; database
/// errors are returned.
pub fn recover_from_db(state: &mut AppState) -> anyhow::Result<bool> {
    let snapshot = match state.db.load_snapshot() {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            info!("No saved auction found, starting fresh");
            return Ok(false);
        }
        Err(e) if e.chain().any(|cause| cause.is::<serde_json::Error>()) => {
            warn!("Saved auction is unreadable, starting fresh: {:#}", e);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    state.engine = AuctionEngine::init(state.config.rules, snapshot);
    let sold: usize = state.engine.teams().iter().map(|t| t.roster.len()).sum();
    info!(
        "Restored auction: {} players, {} teams, {} sold, {} unsold record(s)",
        state.engine.players().len(),
        state.engine.teams().len(),
        sold,
        state.engine.unsold_log().len()
    );
    Ok(true)
}

/// Add every player from `path` to the pool. Returns how many were added.
pub fn seed_player_pool(state: &mut AppState, path: &Path) -> Result<usize, ImportError> {
    let players = import::load_player_pool(path)?;
    let count = players.len();
    for player in players {
        state.engine.add_player(player);
    }
    info!("Seeded {} players from {}", count, path.display());
    Ok(count)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use auction_core::{AuctionRules, Category, CategoryBase, Stage};

    fn test_config() -> Config {
        Config {
            rules: AuctionRules::default(),
            category_base: CategoryBase::default(),
            team_names: vec!["Strikers".into(), "Royals".into()],
            db_path: ":memory:".into(),
            player_pool: None,
        }
    }

    fn create_test_app_state() -> AppState {
        let db = Database::open(":memory:").expect("in-memory database should open");
        let mut state = AppState::new(test_config(), db);
        for (name, category) in [("Asha", Category::Uncapped), ("Ravi", Category::Elite)] {
            state.handle_command(UserCommand::AddPlayer {
                category,
                base_price: None,
                role: "Batter".into(),
                name: name.into(),
            });
        }
        state
    }

    fn bid(team: &str, amount: &str) -> UserCommand {
        UserCommand::Bid {
            team: team.into(),
            amount: amount.into(),
        }
    }

    fn rejected(updates: &[UiUpdate]) -> Option<&AuctionError> {
        match updates {
            [UiUpdate::Rejected(err)] => Some(err),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Tests: command handling
    // -----------------------------------------------------------------------

    #[test]
    fn new_state_uses_configured_teams_and_bases() {
        let mut config = test_config();
        config.category_base.set(Category::Elite, 18_000);
        let state = AppState::new(config, Database::open(":memory:").unwrap());
        assert_eq!(state.engine.teams().len(), 2);
        assert_eq!(state.engine.teams()[1].name, "Royals");
        assert_eq!(state.engine.category_base_of(Category::Elite), 18_000);
    }

    #[test]
    fn references_resolve_by_id_or_name() {
        let state = create_test_app_state();
        assert_eq!(state.resolve_player("p-2").unwrap(), "p-2");
        assert_eq!(state.resolve_player("asha").unwrap(), "p-1");
        assert_eq!(state.resolve_team("ROYALS").unwrap(), "t-2");
        assert_eq!(
            state.resolve_team("Kings").unwrap_err(),
            AuctionError::UnknownTeam {
                team_id: "Kings".into()
            }
        );
    }

    #[test]
    fn full_round_persists_snapshot_and_sale() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "Asha".into(),
        });
        state.handle_command(bid("Strikers", "6000"));
        let updates = state.handle_command(UserCommand::Sold);
        assert!(matches!(&updates[0], UiUpdate::Sold(s) if s.bid == 6000));

        let sales = state.db.load_sales().unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].team_name, "Strikers");

        let stored = state.db.load_snapshot().unwrap().unwrap();
        let restored = AuctionEngine::init(AuctionRules::default(), stored);
        assert_eq!(restored.owner_of("p-1"), Some("Strikers"));
        assert_eq!(restored.team("t-1").unwrap().budget, 144_000);
    }

    #[test]
    fn rejections_are_reported_without_state_change() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "Asha".into(),
        });
        state.handle_command(bid("t-1", "6000"));

        let updates = state.handle_command(bid("t-2", "6500"));
        assert_eq!(
            rejected(&updates),
            Some(&AuctionError::BelowMinimum { minimum: 7000 })
        );
        let updates = state.handle_command(bid("t-2", "abc"));
        assert_eq!(rejected(&updates), Some(&AuctionError::InvalidAmount));

        let round = state.engine.round().unwrap();
        assert_eq!(round.ledger.len(), 1);
        assert_eq!(round.current_bid, Some(6000));
    }

    #[test]
    fn unsold_with_leader_is_refused() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "Ravi".into(),
        });
        state.handle_command(bid("t-2", "15000"));
        let updates = state.handle_command(UserCommand::Unsold);
        assert_eq!(rejected(&updates).map(AuctionError::kind), Some("leader_present"));

        state.handle_command(UserCommand::Undo);
        let updates = state.handle_command(UserCommand::Unsold);
        assert!(matches!(&updates[0], UiUpdate::Unsold(r) if r.player_name == "Ravi"));
        assert_eq!(state.engine.unsold_log().len(), 1);
    }

    #[test]
    fn refund_by_name_restores_budget() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "Ravi".into(),
        });
        state.handle_command(bid("Royals", "16000"));
        state.handle_command(UserCommand::Sold);

        let updates = state.handle_command(UserCommand::Refund {
            target: "Royals ravi".into(),
        });
        assert!(matches!(&updates[0], UiUpdate::Refunded(r) if r.refund == 16_000));
        assert_eq!(state.engine.team("t-2").unwrap().budget, 150_000);
        assert!(state.engine.owner_of("p-2").is_none());
    }

    #[test]
    fn results_refused_mid_round_then_shown() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "p-1".into(),
        });
        let updates = state.handle_command(UserCommand::Results);
        assert_eq!(rejected(&updates).map(AuctionError::kind), Some("round_in_progress"));

        state.handle_command(UserCommand::Back);
        let updates = state.handle_command(UserCommand::Results);
        assert!(matches!(&updates[0], UiUpdate::Results { teams, .. } if teams.len() == 2));
        assert_eq!(state.engine.stage(), Stage::Results);
    }

    #[test]
    fn results_carry_the_unsold_log() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "Ravi".into(),
        });
        state.handle_command(UserCommand::Unsold);

        let updates = state.handle_command(UserCommand::Results);
        let UiUpdate::Results { unsold, .. } = &updates[0] else {
            panic!("expected results, got {:?}", updates[0]);
        };
        assert_eq!(unsold.len(), 1);
        assert_eq!(unsold[0].player.name, "Ravi");
        assert_eq!(unsold[0].player.category, Category::Elite);
    }

    #[test]
    fn refund_resolves_multi_word_team_names() {
        let mut config = test_config();
        config.team_names = vec!["Thunder".into(), "Thunder Strikers".into()];
        let mut state = AppState::new(config, Database::open(":memory:").unwrap());
        state.handle_command(UserCommand::AddPlayer {
            category: Category::Elite,
            base_price: None,
            role: "Keeper".into(),
            name: "Ravi Kumar".into(),
        });
        state.handle_command(UserCommand::Send {
            player: "Ravi Kumar".into(),
        });
        state.handle_command(bid("Thunder Strikers", "15000"));
        state.handle_command(UserCommand::Sold);

        let updates = state.handle_command(UserCommand::Refund {
            target: "thunder strikers Ravi Kumar".into(),
        });
        assert!(matches!(&updates[0], UiUpdate::Refunded(r) if r.team_name == "Thunder Strikers"));
        assert_eq!(state.engine.team("t-2").unwrap().budget, 150_000);

        let updates = state.handle_command(UserCommand::Refund {
            target: "Lightning Ravi Kumar".into(),
        });
        assert_eq!(
            rejected(&updates),
            Some(&AuctionError::UnknownTeam {
                team_id: "Lightning".into()
            })
        );
    }

    #[test]
    fn reset_requires_confirmation_then_wipes_everything() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "Asha".into(),
        });
        state.handle_command(bid("t-1", "6000"));
        state.handle_command(UserCommand::Sold);
        state.handle_command(UserCommand::AddTeam {
            name: "Kings".into(),
        });

        state.handle_command(UserCommand::Reset { confirmed: false });
        assert_eq!(state.engine.teams().len(), 3);
        assert_eq!(state.db.load_sales().unwrap().len(), 1);

        let updates = state.handle_command(UserCommand::Reset { confirmed: true });
        assert!(matches!(&updates[0], UiUpdate::Info(msg) if msg.starts_with("Auction reset")));
        assert!(state.engine.players().is_empty());
        assert_eq!(state.engine.teams().len(), 2);
        assert_eq!(state.engine.team("t-1").unwrap().budget, 150_000);
        assert!(state.db.load_sales().unwrap().is_empty());

        let stored = state.db.load_snapshot().unwrap().unwrap();
        assert!(stored.players.is_empty());
        assert_eq!(stored.teams.len(), 2);
    }

    #[test]
    fn pool_update_marks_owners() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "Asha".into(),
        });
        state.handle_command(bid("t-1", "6000"));
        state.handle_command(UserCommand::Sold);

        let updates = state.handle_command(UserCommand::ShowPool);
        let UiUpdate::Pool(groups) = &updates[0] else {
            panic!("expected pool update, got {:?}", updates[0]);
        };
        let asha = groups
            .iter()
            .flat_map(|g| &g.players)
            .find(|p| p.name == "Asha")
            .unwrap();
        assert_eq!(asha.owner.as_deref(), Some("Strikers"));
    }

    #[test]
    fn edit_base_on_block_refreshes_round() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "Asha".into(),
        });
        let updates = state.handle_command(UserCommand::EditBase {
            player: "Asha".into(),
            amount: 8000,
        });
        assert!(matches!(&updates[0], UiUpdate::Round(r) if r.suggested_next_bid == 8000));
    }

    // -----------------------------------------------------------------------
    // Tests: crash recovery and seeding
    // -----------------------------------------------------------------------

    #[test]
    fn crash_recovery_restores_state() {
        let mut state = create_test_app_state();
        state.handle_command(UserCommand::Send {
            player: "Asha".into(),
        });
        state.handle_command(bid("t-1", "7000"));
        state.handle_command(UserCommand::Sold);

        let AppState { config, db, .. } = state;
        let mut recovered = AppState::new(config, db);
        assert!(recover_from_db(&mut recovered).unwrap());
        assert_eq!(recovered.engine.players().len(), 2);
        assert_eq!(recovered.engine.team("t-1").unwrap().budget, 143_000);
        assert_eq!(recovered.engine.owner_of("p-1"), Some("Strikers"));
    }

    #[test]
    fn crash_recovery_on_fresh_db_returns_false() {
        let mut state = AppState::new(test_config(), Database::open(":memory:").unwrap());
        assert!(!recover_from_db(&mut state).unwrap());
        assert_eq!(state.engine.teams().len(), 2);
    }

    #[test]
    fn crash_recovery_falls_back_on_unreadable_snapshot() {
        let db = Database::open(":memory:").unwrap();
        db.save_state(Database::SNAPSHOT_KEY, &serde_json::json!({ "players": "none" }))
            .unwrap();
        let mut state = AppState::new(test_config(), db);
        assert!(!recover_from_db(&mut state).unwrap());
        assert_eq!(state.engine.teams().len(), 2);
        assert!(state.engine.players().is_empty());
    }

    #[test]
    fn seed_player_pool_adds_rows() {
        let dir = std::env::temp_dir().join("auction_app_seed_pool");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("players.csv");
        std::fs::write(
            &path,
            "name,role,category,base_price,image,stats_image\n\
             Asha,Bowler,Rising Stars,,,\n\
             Ravi,Keeper,Legends,25000,,\n",
        )
        .unwrap();

        let mut state = AppState::new(test_config(), Database::open(":memory:").unwrap());
        assert_eq!(seed_player_pool(&mut state, &path).unwrap(), 2);
        assert_eq!(state.engine.players()[0].base_price, 10_000);
        assert_eq!(state.engine.players()[1].base_price, 25_000);

        let _ = std::fs::remove_dir_all(&dir);
    }

    // -----------------------------------------------------------------------
    // Tests: async event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn event_loop_handles_quit_command() {
        let state = create_test_app_state();
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, _ui_rx) = mpsc::channel(64);

        let handle = tokio::spawn(run(cmd_rx, ui_tx, state));
        cmd_tx.send(UserCommand::Quit).await.unwrap();

        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn event_loop_forwards_updates_in_order() {
        let state = create_test_app_state();
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, state));

        cmd_tx
            .send(UserCommand::Send {
                player: "Asha".into(),
            })
            .await
            .unwrap();
        let update = ui_rx.recv().await.unwrap();
        assert!(matches!(update, UiUpdate::Round(ref r) if r.suggested_next_bid == 6000));

        cmd_tx.send(bid("t-1", "5000")).await.unwrap();
        let update = ui_rx.recv().await.unwrap();
        assert_eq!(
            update,
            UiUpdate::Rejected(AuctionError::BelowMinimum { minimum: 6000 })
        );

        drop(cmd_tx);
        assert!(handle.await.unwrap().is_ok());
    }
}
