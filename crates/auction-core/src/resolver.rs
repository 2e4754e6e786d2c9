// Sale resolution: the only code that grants or revokes roster ownership.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AuctionError;
use crate::model::{owner_of, Leader, Player, RosterEntry, Team, UnsoldEntry};
use crate::rules::AuctionRules;

/// Outcome of a finalized sale, for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub player_id: String,
    pub player_name: String,
    pub team_id: String,
    pub team_name: String,
    pub team_logo: Option<String>,
    pub bid: u64,
}

/// Outcome of marking a player unsold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsoldReceipt {
    pub player_id: String,
    pub player_name: String,
}

/// Outcome of removing a player from a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub team_id: String,
    pub team_name: String,
    pub player_id: String,
    pub player_name: String,
    pub refund: u64,
}

/// Check that `team` may buy `player` for `amount`.
///
/// Order matters and is shared by bid validation and sale finalization:
/// ownership first, then roster room, then budget.
pub(crate) fn check_purchase(
    teams: &[Team],
    rules: &AuctionRules,
    player: &Player,
    team: &Team,
    amount: u64,
) -> Result<(), AuctionError> {
    if let Some(owner) = owner_of(teams, &player.id) {
        return Err(AuctionError::AlreadyAssigned {
            player: player.name.clone(),
            owner: owner.to_string(),
        });
    }

    if team.roster.len() >= rules.roster_cap {
        return Err(AuctionError::RosterFull {
            team: team.name.clone(),
            cap: rules.roster_cap,
        });
    }

    if amount > team.budget {
        return Err(AuctionError::InsufficientBudget {
            team: team.name.clone(),
            budget: team.budget,
            amount,
        });
    }

    Ok(())
}

/// Sell `player` to the leading team for `bid`.
///
/// Re-runs the purchase checks because budgets or rosters may have changed
/// since the bid was accepted. On success the bid is deducted and a roster
/// entry appended in one step; on failure nothing changes.
pub fn commit_sale(
    teams: &mut [Team],
    rules: &AuctionRules,
    player: &Player,
    leader: &Leader,
    bid: u64,
) -> Result<SaleReceipt, AuctionError> {
    let idx = teams
        .iter()
        .position(|t| t.id == leader.id)
        .ok_or_else(|| AuctionError::UnknownTeam {
            team_id: leader.id.clone(),
        })?;

    check_purchase(teams, rules, player, &teams[idx], bid)?;

    let team = &mut teams[idx];
    team.budget -= bid;
    team.roster.push(RosterEntry {
        player: player.clone(),
        winning_bid: bid,
    });

    info!(
        "Sold {} ({}) to {} for {} pts, {} pts left",
        player.name, player.id, team.name, bid, team.budget
    );

    Ok(SaleReceipt {
        player_id: player.id.clone(),
        player_name: player.name.clone(),
        team_id: team.id.clone(),
        team_name: team.name.clone(),
        team_logo: team.logo.clone(),
        bid,
    })
}

/// Record `player` as unsold: log it and move the pool copy to `Unsold`.
///
/// Not guarded by ownership; the caller decides whether marking unsold is
/// allowed.
pub fn commit_unsold(
    players: &mut [Player],
    unsold: &mut Vec<UnsoldEntry>,
    player: &Player,
    timestamp: i64,
) -> UnsoldReceipt {
    unsold.push(UnsoldEntry {
        player: player.clone(),
        timestamp,
    });

    if let Some(pooled) = players.iter_mut().find(|p| p.id == player.id) {
        pooled.category = crate::model::Category::Unsold;
    }

    info!("Marked {} ({}) unsold", player.name, player.id);

    UnsoldReceipt {
        player_id: player.id.clone(),
        player_name: player.name.clone(),
    }
}

/// Remove a player from a team's roster and refund the price paid.
pub fn remove_from_roster(
    teams: &mut [Team],
    team_id: &str,
    player_id: &str,
) -> Result<RefundReceipt, AuctionError> {
    let team = teams
        .iter_mut()
        .find(|t| t.id == team_id)
        .ok_or_else(|| AuctionError::UnknownTeam {
            team_id: team_id.to_string(),
        })?;

    let pos = team
        .roster
        .iter()
        .position(|e| e.player.id == player_id)
        .ok_or_else(|| AuctionError::NotOnRoster {
            team: team.name.clone(),
            player_id: player_id.to_string(),
        })?;

    let entry = team.roster.remove(pos);
    team.budget = team.budget.saturating_add(entry.winning_bid);

    info!(
        "Removed {} from {}, refunded {} pts",
        entry.player.name, team.name, entry.winning_bid
    );

    Ok(RefundReceipt {
        team_id: team.id.clone(),
        team_name: team.name.clone(),
        player_id: entry.player.id,
        player_name: entry.player.name,
        refund: entry.winning_bid,
    })
}
