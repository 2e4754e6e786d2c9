// Domain entities: players, teams, rosters, bids, and the assignment index.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Player pool categories. A player lands in `Unsold` once an auction round
/// for them closes without a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Legends,
    Elite,
    #[serde(rename = "Rising Stars")]
    RisingStars,
    Uncapped,
    Unsold,
}

impl Category {
    /// Every category, in pool display order (`Unsold` last).
    pub const ALL: [Category; 5] = [
        Category::Legends,
        Category::Elite,
        Category::RisingStars,
        Category::Uncapped,
        Category::Unsold,
    ];

    /// Parse an operator-supplied category name.
    ///
    /// Accepts the display names ("Rising Stars") as well as short keys
    /// ("rising"), case-insensitively.
    pub fn from_str_cat(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "legends" | "legend" => Some(Category::Legends),
            "elite" => Some(Category::Elite),
            "rising stars" | "rising" | "rising-stars" | "rising_stars" => {
                Some(Category::RisingStars)
            }
            "uncapped" => Some(Category::Uncapped),
            "unsold" => Some(Category::Unsold),
            _ => None,
        }
    }

    /// Return the display string for this category.
    pub fn display_str(&self) -> &'static str {
        match self {
            Category::Legends => "Legends",
            Category::Elite => "Elite",
            Category::RisingStars => "Rising Stars",
            Category::Uncapped => "Uncapped",
            Category::Unsold => "Unsold",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A player in the auction pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub category: Category,
    #[serde(default)]
    pub base_price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_image: Option<String>,
}

/// A player bought by a team, together with the price paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(flatten)]
    pub player: Player,
    pub winning_bid: u64,
}

/// A team taking part in the auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// Points left to spend.
    pub budget: u64,
    pub roster: Vec<RosterEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Team {
    /// Create an empty team with the given starting budget.
    pub fn new(id: impl Into<String>, name: impl Into<String>, budget: u64) -> Self {
        Team {
            id: id.into(),
            name: name.into(),
            budget,
            roster: Vec::new(),
            logo: None,
        }
    }

    /// Total points paid for the current roster.
    pub fn spent(&self) -> u64 {
        self.roster.iter().map(|e| e.winning_bid).sum()
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.roster.iter().any(|e| e.player.id == player_id)
    }
}

/// The team currently holding the high bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub id: String,
    pub name: String,
}

/// One accepted bid in the active round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRecord {
    pub bid: u64,
    pub team_id: String,
    pub team_name: String,
}

impl BidRecord {
    pub fn leader(&self) -> Leader {
        Leader {
            id: self.team_id.clone(),
            name: self.team_name.clone(),
        }
    }
}

/// A player recorded as unsold, with the Unix time in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsoldEntry {
    pub player: Player,
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// Assignment index
// ---------------------------------------------------------------------------

/// Map every rostered player id to the name of the team that owns it.
///
/// Always recomputed from `teams`; callers must not cache the result across
/// roster mutations.
pub fn assignments(teams: &[Team]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for team in teams {
        for entry in &team.roster {
            map.insert(entry.player.id.clone(), team.name.clone());
        }
    }
    map
}

/// Name of the team owning `player_id`, if any.
pub fn owner_of<'a>(teams: &'a [Team], player_id: &str) -> Option<&'a str> {
    teams
        .iter()
        .find(|t| t.has_player(player_id))
        .map(|t| t.name.as_str())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn player(id: &str, category: Category, base_price: u64) -> Player {
        Player {
            id: id.to_string(),
            name: format!("Player {id}"),
            role: "Batter".to_string(),
            category,
            base_price,
            image: None,
            stats_image: None,
        }
    }

    pub fn rostered(id: &str, winning_bid: u64) -> RosterEntry {
        RosterEntry {
            player: player(id, Category::Elite, 15000),
            winning_bid,
        }
    }
}
