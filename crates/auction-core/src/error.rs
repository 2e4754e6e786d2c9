// Rejection taxonomy for auction operations.

use thiserror::Error;

/// Why an auction operation was refused.
///
/// Every variant is recoverable: the engine leaves its state untouched when it
/// returns one of these, and the `Display` text is suitable for showing to the
/// operator as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Enter a positive bid value.")]
    InvalidAmount,

    #[error("Bid must be at least {minimum} pts.")]
    BelowMinimum { minimum: u64 },

    #[error("{player} already belongs to {owner}.")]
    AlreadyAssigned { player: String, owner: String },

    #[error("{team} already has {cap} players.")]
    RosterFull { team: String, cap: usize },

    #[error("{team} does not have enough auction points ({budget} left, bid {amount}).")]
    InsufficientBudget {
        team: String,
        budget: u64,
        amount: u64,
    },

    #[error("Set a current bid and leader before finalizing.")]
    NothingToFinalize,

    #[error("No player is up for auction.")]
    NoActivePlayer,

    #[error("Unknown team `{team_id}`.")]
    UnknownTeam { team_id: String },

    #[error("Unknown player `{player_id}`.")]
    PlayerNotFound { player_id: String },

    #[error("{player_id} is not on {team}'s roster.")]
    NotOnRoster { team: String, player_id: String },

    #[error("{player} is still up for auction; finish or abandon the round first.")]
    RoundInProgress { player: String },

    #[error("{team} holds the current bid; finalize the sale instead of marking unsold.")]
    LeaderPresent { team: String },

    #[error("Results are showing; go `back` to the pool before sending a player.")]
    ResultsShowing,
}

impl AuctionError {
    /// Short machine-friendly name of the rejection kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuctionError::InvalidAmount => "invalid_amount",
            AuctionError::BelowMinimum { .. } => "below_minimum",
            AuctionError::AlreadyAssigned { .. } => "already_assigned",
            AuctionError::RosterFull { .. } => "roster_full",
            AuctionError::InsufficientBudget { .. } => "insufficient_budget",
            AuctionError::NothingToFinalize => "nothing_to_finalize",
            AuctionError::NoActivePlayer => "no_active_player",
            AuctionError::UnknownTeam { .. } => "unknown_team",
            AuctionError::PlayerNotFound { .. } => "player_not_found",
            AuctionError::NotOnRoster { .. } => "not_on_roster",
            AuctionError::RoundInProgress { .. } => "round_in_progress",
            AuctionError::LeaderPresent { .. } => "leader_present",
            AuctionError::ResultsShowing => "results_showing",
        }
    }
}
