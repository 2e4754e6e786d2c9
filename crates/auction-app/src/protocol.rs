// Messages between the operator front end and the application loop.

use auction_core::resolver::{RefundReceipt, SaleReceipt, UnsoldReceipt};
use auction_core::{AuctionError, Category, RoundSnapshot, Team, UnsoldEntry};

/// Commands from the operator to the application loop.
///
/// Player and team arguments are references typed by the operator: either an
/// id (`p-3`, `t-1`) or a name, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    ShowPool,
    Send { player: String },
    /// `amount` stays raw text so the engine can classify bad input.
    Bid { team: String, amount: String },
    Undo,
    Sold,
    Unsold,
    Back,
    Results,
    /// A team reference followed by a player reference. Team names may
    /// contain spaces, so the split is made against the known teams.
    Refund { target: String },
    AddPlayer {
        category: Category,
        /// `None` uses the category preset.
        base_price: Option<u64>,
        role: String,
        name: String,
    },
    EditBase { player: String, amount: u64 },
    ResetBase { player: String },
    RemovePlayer { player: String },
    AddTeam { name: String },
    RemoveTeam { team: String },
    SetBase { category: Category, amount: u64 },
    ClearUnsold,
    /// Wipe players, teams, sales and the unsold log, then start over from
    /// config. Without confirmation only a warning is shown.
    Reset { confirmed: bool },
    Status,
    Help,
    Quit,
}

/// A pooled player as listed in the pool view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    pub id: String,
    pub name: String,
    pub role: String,
    pub base_price: u64,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolGroup {
    pub category: Category,
    pub players: Vec<PoolEntry>,
}

/// Budget line for one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSummary {
    pub id: String,
    pub name: String,
    pub budget: u64,
    pub spent: u64,
    pub roster_len: usize,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        TeamSummary {
            id: team.id.clone(),
            name: team.name.clone(),
            budget: team.budget,
            spent: team.spent(),
            roster_len: team.roster.len(),
        }
    }
}

/// Updates pushed from the application loop to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Info(String),
    Rejected(AuctionError),
    Round(Box<RoundSnapshot>),
    Sold(SaleReceipt),
    Unsold(UnsoldReceipt),
    Refunded(RefundReceipt),
    Pool(Vec<PoolGroup>),
    Teams(Vec<TeamSummary>),
    Results {
        teams: Vec<Team>,
        unsold: Vec<UnsoldEntry>,
    },
    Help,
}
