// Player pool and team list maintenance between rounds.

use tracing::{info, warn};

use crate::engine::AuctionEngine;
use crate::error::AuctionError;
use crate::model::{Category, Player, Team};

/// Fields for a player being added to the pool.
#[derive(Debug, Clone, Default)]
pub struct NewPlayer {
    pub name: String,
    pub role: String,
    pub category: Option<Category>,
    /// `None` uses the category's preset base price.
    pub base_price: Option<u64>,
    pub image: Option<String>,
    pub stats_image: Option<String>,
}

/// Changes to an existing player. `None` leaves a field unchanged; an empty
/// image string clears the image.
#[derive(Debug, Clone, Default)]
pub struct PlayerEdit {
    pub name: Option<String>,
    pub role: Option<String>,
    pub base_price: Option<u64>,
    pub image: Option<String>,
    pub stats_image: Option<String>,
}

impl AuctionEngine {
    /// Add a player to the pool and return the new id.
    pub fn add_player(&mut self, new: NewPlayer) -> String {
        let category = new.category.unwrap_or(Category::Legends);
        let id = next_id("p", |id| self.players.iter().any(|p| p.id == id));
        let name = non_blank(&new.name).unwrap_or("New Player").to_string();
        let role = non_blank(&new.role).unwrap_or("Squad Player").to_string();
        let base_price = new
            .base_price
            .unwrap_or_else(|| self.category_base.get(category));

        info!("Added {} ({}) to {} at {} pts", name, id, category, base_price);
        self.players.push(Player {
            id: id.clone(),
            name,
            role,
            category,
            base_price,
            image: new.image.as_deref().and_then(non_blank).map(str::to_string),
            stats_image: new
                .stats_image
                .as_deref()
                .and_then(non_blank)
                .map(str::to_string),
        });
        id
    }

    /// Apply `edit` to a pooled player. When that player is on the block the
    /// round copy follows, and the current bid never falls below the new base.
    pub fn edit_player(&mut self, player_id: &str, edit: PlayerEdit) -> Result<(), AuctionError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| AuctionError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;

        if let Some(name) = edit.name.as_deref().and_then(non_blank) {
            player.name = name.to_string();
        }
        if let Some(role) = edit.role.as_deref().and_then(non_blank) {
            player.role = role.to_string();
        }
        if let Some(base) = edit.base_price {
            player.base_price = base;
        }
        if let Some(image) = &edit.image {
            player.image = non_blank(image).map(str::to_string);
        }
        if let Some(stats) = &edit.stats_image {
            player.stats_image = non_blank(stats).map(str::to_string);
        }

        let updated = player.clone();
        if let Some(round) = self.round.as_mut().filter(|r| r.player.id == player_id) {
            let base = updated.base_price;
            round.player = updated;
            if let Some(bid) = round.current_bid {
                round.current_bid = Some(bid.max(base));
            }
            round.suggested_next_bid = round.suggested_next_bid.max(base);
        }
        Ok(())
    }

    /// Reset a player's base price to its category preset.
    pub fn reset_base_to_category(&mut self, player_id: &str) -> Result<u64, AuctionError> {
        let category = self
            .player(player_id)
            .map(|p| p.category)
            .ok_or_else(|| AuctionError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;
        let base = self.category_base.get(category);
        self.edit_player(
            player_id,
            PlayerEdit {
                base_price: Some(base),
                ..PlayerEdit::default()
            },
        )?;
        Ok(base)
    }

    /// Delete a player from the pool. Owned players cannot be removed; a
    /// player on the block is removed and their round abandoned.
    pub fn remove_player(&mut self, player_id: &str) -> Result<Player, AuctionError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| AuctionError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;

        if let Some(owner) = self.owner_of(player_id) {
            return Err(AuctionError::AlreadyAssigned {
                player: self.players[idx].name.clone(),
                owner: owner.to_string(),
            });
        }

        if self.round.as_ref().is_some_and(|r| r.player.id == player_id) {
            self.reset_round();
        }

        let removed = self.players.remove(idx);
        info!("Removed {} ({}) from the pool", removed.name, removed.id);
        Ok(removed)
    }

    /// Register a team with the configured starting budget.
    pub fn add_team(&mut self, name: &str) -> String {
        let id = next_id("t", |id| self.teams.iter().any(|t| t.id == id));
        let name = non_blank(name).unwrap_or("Unknown Team");
        info!("Added team {} ({})", name, id);
        self.teams
            .push(Team::new(id.clone(), name, self.rules.initial_budget));
        id
    }

    /// Drop a team. Its roster returns to the pool implicitly since the
    /// assignment index is derived from rosters.
    pub fn remove_team(&mut self, team_id: &str) -> Result<Team, AuctionError> {
        if let Some(round) = &self.round {
            return Err(AuctionError::RoundInProgress {
                player: round.player.name.clone(),
            });
        }
        let idx = self
            .teams
            .iter()
            .position(|t| t.id == team_id)
            .ok_or_else(|| AuctionError::UnknownTeam {
                team_id: team_id.to_string(),
            })?;

        let removed = self.teams.remove(idx);
        if !removed.roster.is_empty() {
            warn!(
                "Removed team {} with {} rostered player(s); they are available again",
                removed.name,
                removed.roster.len()
            );
        }
        Ok(removed)
    }

    pub fn set_category_base(&mut self, category: Category, value: u64) {
        self.category_base.set(category, value);
    }

    /// Players grouped by category in display order, `Unsold` last. Empty
    /// categories are skipped.
    pub fn pool_by_category(&self) -> Vec<(Category, Vec<&Player>)> {
        Category::ALL
            .iter()
            .filter_map(|&category| {
                let players: Vec<&Player> = self
                    .players
                    .iter()
                    .filter(|p| p.category == category)
                    .collect();
                (!players.is_empty()).then_some((category, players))
            })
            .collect()
    }

    /// Empty the unsold log, returning how many entries were dropped.
    pub fn clear_unsold_log(&mut self) -> usize {
        let count = self.unsold.len();
        self.unsold.clear();
        count
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// First `<prefix>-<n>` id not already taken.
fn next_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|n| format!("{prefix}-{n}"))
        .find(|id| !taken(id))
        .unwrap_or_else(|| format!("{prefix}-0"))
}
