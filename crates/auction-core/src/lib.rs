// Library root: the auction bidding engine and the domain types it owns.

pub mod engine;
pub mod error;
pub mod ledger;
pub mod model;
pub mod pool;
pub mod resolver;
pub mod rules;
pub mod snapshot;

pub use engine::{AuctionEngine, AuctionRound, RoundSnapshot, Stage};
pub use error::AuctionError;
pub use model::{BidRecord, Category, Leader, Player, RosterEntry, Team, UnsoldEntry};
pub use rules::{AuctionRules, CategoryBase};
pub use snapshot::AuctionSnapshot;
