// Tournament rules: bid step, roster cap, starting budget, category prices.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Category;

pub const DEFAULT_BID_INCREMENT: u64 = 1000;
pub const DEFAULT_ROSTER_CAP: usize = 14;
pub const DEFAULT_INITIAL_BUDGET: u64 = 150_000;

/// The numeric rules a tournament runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionRules {
    /// Minimum step above the previous accepted bid.
    pub bid_increment: u64,
    /// Maximum players a team may hold.
    pub roster_cap: usize,
    /// Budget every team starts with.
    pub initial_budget: u64,
}

impl Default for AuctionRules {
    fn default() -> Self {
        AuctionRules {
            bid_increment: DEFAULT_BID_INCREMENT,
            roster_cap: DEFAULT_ROSTER_CAP,
            initial_budget: DEFAULT_INITIAL_BUDGET,
        }
    }
}

/// Base price preset per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryBase(BTreeMap<Category, u64>);

impl CategoryBase {
    /// Look up the preset for a category. Categories without an entry fall
    /// back to the built-in defaults.
    pub fn get(&self, category: Category) -> u64 {
        self.0
            .get(&category)
            .copied()
            .unwrap_or_else(|| default_base(category))
    }

    pub fn set(&mut self, category: Category, value: u64) {
        self.0.insert(category, value);
    }

    /// Fill in any category missing from the map with its default.
    pub fn with_defaults(mut self) -> Self {
        for category in Category::ALL {
            self.0.entry(category).or_insert_with(|| default_base(category));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        self.0.iter().map(|(c, v)| (*c, *v))
    }
}

impl Default for CategoryBase {
    fn default() -> Self {
        CategoryBase(BTreeMap::new()).with_defaults()
    }
}

impl From<BTreeMap<Category, u64>> for CategoryBase {
    fn from(map: BTreeMap<Category, u64>) -> Self {
        CategoryBase(map).with_defaults()
    }
}

fn default_base(category: Category) -> u64 {
    match category {
        Category::Legends => 20_000,
        Category::Elite => 15_000,
        Category::RisingStars => 10_000,
        Category::Uncapped => 6_000,
        Category::Unsold => 0,
    }
}
