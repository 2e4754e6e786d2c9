// Auction state machine: stage transitions, bid validation, round lifecycle.
//
// The engine owns the player pool, the teams, the unsold log and the single
// active round. Every operation is synchronous and either commits fully or
// returns an `AuctionError` without touching state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AuctionError;
use crate::ledger::BidLedger;
use crate::model::{self, BidRecord, Category, Leader, Player, Team, UnsoldEntry};
use crate::resolver::{self, RefundReceipt, SaleReceipt, UnsoldReceipt};
use crate::rules::{AuctionRules, CategoryBase};
use crate::snapshot::AuctionSnapshot;

/// Which screen the operator is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Pool,
    Auction,
    Results,
}

/// State of the one player currently under the hammer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRound {
    pub player: Player,
    pub current_bid: Option<u64>,
    pub current_leader: Option<Leader>,
    pub ledger: BidLedger,
    pub suggested_next_bid: u64,
}

impl AuctionRound {
    fn open(player: Player) -> Self {
        let suggested_next_bid = player.base_price;
        AuctionRound {
            player,
            current_bid: None,
            current_leader: None,
            ledger: BidLedger::new(),
            suggested_next_bid,
        }
    }

    /// Lowest amount the next bid may carry.
    ///
    /// With no positive current bid the base price itself is acceptable;
    /// after that every bid must clear the previous one by an increment.
    pub fn minimum_bid(&self, increment: u64) -> u64 {
        match self.current_bid {
            Some(bid) if bid > 0 => bid.saturating_add(increment),
            _ => self.player.base_price,
        }
    }
}

/// What the presentation layer reads after every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub stage: Stage,
    pub active_player: Option<Player>,
    pub current_bid: Option<u64>,
    pub current_leader: Option<Leader>,
    pub bid_history: Vec<BidRecord>,
    pub suggested_next_bid: u64,
}

/// The auction engine.
#[derive(Debug, Clone)]
pub struct AuctionEngine {
    pub(crate) rules: AuctionRules,
    pub(crate) players: Vec<Player>,
    pub(crate) teams: Vec<Team>,
    pub(crate) category_base: CategoryBase,
    pub(crate) unsold: Vec<UnsoldEntry>,
    pub(crate) stage: Stage,
    pub(crate) round: Option<AuctionRound>,
}

impl AuctionEngine {
    /// An engine with no players and no teams.
    pub fn new(rules: AuctionRules) -> Self {
        AuctionEngine {
            rules,
            players: Vec::new(),
            teams: Vec::new(),
            category_base: CategoryBase::default(),
            unsold: Vec::new(),
            stage: Stage::Pool,
            round: None,
        }
    }

    /// Rebuild an engine from a persisted snapshot. The round is never
    /// persisted, so the engine always starts on the pool stage.
    pub fn init(rules: AuctionRules, snapshot: AuctionSnapshot) -> Self {
        let hydrated = snapshot.hydrate(&rules);
        AuctionEngine {
            rules,
            players: hydrated.players,
            teams: hydrated.teams,
            category_base: hydrated.category_base,
            unsold: hydrated.unsold,
            stage: Stage::Pool,
            round: None,
        }
    }

    /// Capture everything that outlives a round.
    pub fn serialize(&self) -> AuctionSnapshot {
        AuctionSnapshot::capture(
            &self.players,
            &self.teams,
            &self.category_base,
            &self.unsold,
        )
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn rules(&self) -> &AuctionRules {
        &self.rules
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn unsold_log(&self) -> &[UnsoldEntry] {
        &self.unsold
    }

    pub fn round(&self) -> Option<&AuctionRound> {
        self.round.as_ref()
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    pub fn category_base(&self) -> &CategoryBase {
        &self.category_base
    }

    pub fn category_base_of(&self, category: Category) -> u64 {
        self.category_base.get(category)
    }

    /// Player id → owning team name, recomputed from the rosters.
    pub fn assignments(&self) -> std::collections::HashMap<String, String> {
        model::assignments(&self.teams)
    }

    pub fn owner_of(&self, player_id: &str) -> Option<&str> {
        model::owner_of(&self.teams, player_id)
    }

    pub fn round_snapshot(&self) -> RoundSnapshot {
        match &self.round {
            Some(round) => RoundSnapshot {
                stage: self.stage,
                active_player: Some(round.player.clone()),
                current_bid: round.current_bid,
                current_leader: round.current_leader.clone(),
                bid_history: round.ledger.records().to_vec(),
                suggested_next_bid: round.suggested_next_bid,
            },
            None => RoundSnapshot {
                stage: self.stage,
                active_player: None,
                current_bid: None,
                current_leader: None,
                bid_history: Vec::new(),
                suggested_next_bid: 0,
            },
        }
    }

    // ------------------------------------------------------------------
    // Stage transitions
    // ------------------------------------------------------------------

    /// Open a round for `player_id`. Only allowed from the pool stage.
    pub fn send_to_auction(&mut self, player_id: &str) -> Result<(), AuctionError> {
        if let Some(round) = &self.round {
            return Err(AuctionError::RoundInProgress {
                player: round.player.name.clone(),
            });
        }
        if self.stage == Stage::Results {
            return Err(AuctionError::ResultsShowing);
        }

        let player = self
            .player(player_id)
            .ok_or_else(|| AuctionError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;

        if let Some(owner) = self.owner_of(player_id) {
            return Err(AuctionError::AlreadyAssigned {
                player: player.name.clone(),
                owner: owner.to_string(),
            });
        }

        info!(
            "Round opened for {} ({}, base {} pts)",
            player.name, player.category, player.base_price
        );
        self.round = Some(AuctionRound::open(player.clone()));
        self.stage = Stage::Auction;
        Ok(())
    }

    /// Abandon the active round without recording anything.
    pub fn reset_round(&mut self) {
        if let Some(round) = self.round.take() {
            info!(
                "Round for {} abandoned after {} bid(s)",
                round.player.name,
                round.ledger.len()
            );
        }
        self.stage = Stage::Pool;
    }

    /// Return to the pool from either the auction or the results stage.
    pub fn back(&mut self) {
        self.reset_round();
    }

    /// Switch to the read-only results stage.
    pub fn show_results(&mut self) -> Result<(), AuctionError> {
        if let Some(round) = &self.round {
            return Err(AuctionError::RoundInProgress {
                player: round.player.name.clone(),
            });
        }
        self.stage = Stage::Results;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bidding
    // ------------------------------------------------------------------

    /// Submit a bid of `amount` points for `team_id`.
    pub fn place_bid(&mut self, team_id: &str, amount: u64) -> Result<BidRecord, AuctionError> {
        self.try_bid(team_id, Ok(amount))
    }

    /// Submit a bid typed by the operator. The text is parsed only after the
    /// round and team have been checked.
    pub fn place_bid_raw(&mut self, team_id: &str, raw: &str) -> Result<BidRecord, AuctionError> {
        self.try_bid(team_id, parse_amount(raw))
    }

    fn try_bid(
        &mut self,
        team_id: &str,
        amount: Result<u64, AuctionError>,
    ) -> Result<BidRecord, AuctionError> {
        let result = self.validate_bid(team_id, amount);
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Bid from {} rejected: {} ({})", team_id, e, e.kind());
                return Err(e);
            }
        };

        let increment = self.rules.bid_increment;
        let Some(round) = self.round.as_mut() else {
            return Err(AuctionError::NoActivePlayer);
        };
        round.current_bid = Some(record.bid);
        round.current_leader = Some(record.leader());
        round.suggested_next_bid = record.bid.saturating_add(increment);
        round.ledger.append(record.clone());

        debug!(
            "Bid accepted: {} bids {} pts for {}",
            record.team_name, record.bid, round.player.name
        );
        Ok(record)
    }

    fn validate_bid(
        &self,
        team_id: &str,
        amount: Result<u64, AuctionError>,
    ) -> Result<BidRecord, AuctionError> {
        let round = self.round.as_ref().ok_or(AuctionError::NoActivePlayer)?;
        let team = self.team(team_id).ok_or_else(|| AuctionError::UnknownTeam {
            team_id: team_id.to_string(),
        })?;

        let amount = amount?;
        if amount == 0 {
            return Err(AuctionError::InvalidAmount);
        }

        let minimum = round.minimum_bid(self.rules.bid_increment);
        if amount < minimum {
            return Err(AuctionError::BelowMinimum { minimum });
        }

        resolver::check_purchase(&self.teams, &self.rules, &round.player, team, amount)?;

        Ok(BidRecord {
            bid: amount,
            team_id: team.id.clone(),
            team_name: team.name.clone(),
        })
    }

    /// Undo the most recent accepted bid. Returns the removed record, or
    /// `None` when there was nothing to undo.
    pub fn reverse_bid(&mut self) -> Option<BidRecord> {
        let increment = self.rules.bid_increment;
        let round = self.round.as_mut()?;
        let popped = round.ledger.pop_last()?;

        match round.ledger.last() {
            Some(previous) => {
                round.current_bid = Some(previous.bid);
                round.current_leader = Some(previous.leader());
                round.suggested_next_bid = previous.bid.saturating_add(increment);
            }
            None => {
                let base = round.player.base_price;
                round.current_bid = Some(base);
                round.current_leader = None;
                round.suggested_next_bid = base.saturating_add(increment);
            }
        }

        debug!(
            "Reversed {} pts bid by {}; {} bid(s) remain",
            popped.bid,
            popped.team_name,
            round.ledger.len()
        );
        Some(popped)
    }

    // ------------------------------------------------------------------
    // Round outcomes
    // ------------------------------------------------------------------

    /// Sell the active player to the current leader and close the round.
    ///
    /// Safe to call twice: once the round is cleared the second call yields
    /// `NothingToFinalize`.
    pub fn finalize_sale(&mut self) -> Result<SaleReceipt, AuctionError> {
        let round = self.round.as_ref().ok_or(AuctionError::NothingToFinalize)?;
        let (Some(leader), Some(bid)) = (&round.current_leader, round.current_bid) else {
            return Err(AuctionError::NothingToFinalize);
        };

        let receipt = resolver::commit_sale(&mut self.teams, &self.rules, &round.player, leader, bid)?;

        self.round = None;
        self.stage = Stage::Pool;
        Ok(receipt)
    }

    /// Close the round without a sale, stamping the unsold log with now.
    pub fn mark_unsold(&mut self) -> Result<UnsoldReceipt, AuctionError> {
        self.mark_unsold_at(chrono::Utc::now().timestamp_millis())
    }

    /// Close the round without a sale. Refused while a team leads the
    /// bidding; that round should be finalized instead.
    pub fn mark_unsold_at(&mut self, timestamp: i64) -> Result<UnsoldReceipt, AuctionError> {
        let round = self.round.as_ref().ok_or(AuctionError::NoActivePlayer)?;
        if let Some(leader) = &round.current_leader {
            return Err(AuctionError::LeaderPresent {
                team: leader.name.clone(),
            });
        }

        let receipt =
            resolver::commit_unsold(&mut self.players, &mut self.unsold, &round.player, timestamp);

        self.round = None;
        self.stage = Stage::Pool;
        Ok(receipt)
    }

    /// Take a player off a team's roster and refund what the team paid.
    pub fn remove_player_from_team(
        &mut self,
        team_id: &str,
        player_id: &str,
    ) -> Result<RefundReceipt, AuctionError> {
        resolver::remove_from_roster(&mut self.teams, team_id, player_id)
    }
}

/// Parse operator-entered bid text into whole points.
///
/// Rejects anything that is not a finite, positive, whole number.
pub fn parse_amount(raw: &str) -> Result<u64, AuctionError> {
    let value: f64 = raw.trim().parse().map_err(|_| AuctionError::InvalidAmount)?;
    if !value.is_finite() || value <= 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return Err(AuctionError::InvalidAmount);
    }
    Ok(value as u64)
}
