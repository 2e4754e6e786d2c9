// Persisted engine state and defensive re-hydration.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::model::{Category, Player, RosterEntry, Team, UnsoldEntry};
use crate::rules::{AuctionRules, CategoryBase};

/// Serialized form of everything that outlives a round.
///
/// Every record field is optional on the way in so that partially written or
/// older snapshots still load; `hydrate` fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSnapshot {
    #[serde(default)]
    pub players: Vec<StoredPlayer>,
    #[serde(default)]
    pub teams: Vec<StoredTeam>,
    #[serde(default)]
    pub category_base: BTreeMap<Category, u64>,
    #[serde(default)]
    pub unsold: Vec<StoredUnsold>,
}

/// A player as found in storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPlayer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Unrecognised category names read as `None`.
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: Option<Category>,
    #[serde(default)]
    pub base_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_image: Option<String>,
}

/// A roster entry as found in storage: the player's fields plus the price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRosterEntry {
    #[serde(flatten)]
    pub player: StoredPlayer,
    #[serde(default)]
    pub winning_bid: Option<i64>,
}

/// A team as found in storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredTeam {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub budget: Option<i64>,
    #[serde(default)]
    pub roster: Option<Vec<StoredRosterEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// An unsold-log entry as found in storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredUnsold {
    #[serde(default)]
    pub player: Option<StoredPlayer>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

fn lenient_category<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(Category::from_str_cat))
}

fn stored_points(value: u64) -> Option<i64> {
    Some(i64::try_from(value).unwrap_or(i64::MAX))
}

impl From<&Player> for StoredPlayer {
    fn from(player: &Player) -> Self {
        StoredPlayer {
            id: Some(player.id.clone()),
            name: Some(player.name.clone()),
            role: Some(player.role.clone()),
            category: Some(player.category),
            base_price: stored_points(player.base_price),
            image: player.image.clone(),
            stats_image: player.stats_image.clone(),
        }
    }
}

impl From<&RosterEntry> for StoredRosterEntry {
    fn from(entry: &RosterEntry) -> Self {
        StoredRosterEntry {
            player: StoredPlayer::from(&entry.player),
            winning_bid: stored_points(entry.winning_bid),
        }
    }
}

impl From<&Team> for StoredTeam {
    fn from(team: &Team) -> Self {
        StoredTeam {
            id: Some(team.id.clone()),
            name: Some(team.name.clone()),
            budget: stored_points(team.budget),
            roster: Some(team.roster.iter().map(StoredRosterEntry::from).collect()),
            logo: team.logo.clone(),
        }
    }
}

impl From<&UnsoldEntry> for StoredUnsold {
    fn from(entry: &UnsoldEntry) -> Self {
        StoredUnsold {
            player: Some(StoredPlayer::from(&entry.player)),
            timestamp: Some(entry.timestamp),
        }
    }
}

/// Snapshot contents after defaults have been applied.
#[derive(Debug, Clone)]
pub struct Hydrated {
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub category_base: CategoryBase,
    pub unsold: Vec<UnsoldEntry>,
}

/// Hands out `<prefix>-<n>` ids that are not already taken.
struct IdAllocator {
    prefix: &'static str,
    used: HashSet<String>,
    next: usize,
}

impl IdAllocator {
    fn new(prefix: &'static str, used: HashSet<String>) -> Self {
        IdAllocator {
            prefix,
            used,
            next: 1,
        }
    }

    fn fresh(&mut self) -> String {
        loop {
            let candidate = format!("{}-{}", self.prefix, self.next);
            self.next += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Clamp a stored amount to unsigned points, warning about negatives.
fn clamp_points(value: i64, what: &str, owner: &str) -> u64 {
    if value < 0 {
        warn!("{} of {} was negative ({}); clamped to 0", what, owner, value);
        0
    } else {
        value as u64
    }
}

fn hydrate_player(stored: StoredPlayer, base: &CategoryBase, ids: &mut IdAllocator) -> Player {
    let id = stored.id.unwrap_or_else(|| {
        let id = ids.fresh();
        warn!("Stored player without id; assigned {}", id);
        id
    });
    let name = stored.name.unwrap_or_else(|| {
        warn!("Stored player {} has no name", id);
        "Unknown Player".to_string()
    });
    let category = stored.category.unwrap_or_else(|| {
        warn!("Stored player {} has no known category; using Legends", id);
        Category::Legends
    });
    let base_price = match stored.base_price {
        Some(b) => clamp_points(b, "Base price", &id),
        None => base.get(category),
    };
    Player {
        id,
        name,
        role: stored.role.unwrap_or_default(),
        category,
        base_price,
        image: stored.image,
        stats_image: stored.stats_image,
    }
}

impl AuctionSnapshot {
    pub fn capture(
        players: &[Player],
        teams: &[Team],
        category_base: &CategoryBase,
        unsold: &[UnsoldEntry],
    ) -> Self {
        AuctionSnapshot {
            players: players.iter().map(StoredPlayer::from).collect(),
            teams: teams.iter().map(StoredTeam::from).collect(),
            category_base: category_base.iter().collect(),
            unsold: unsold.iter().map(StoredUnsold::from).collect(),
        }
    }

    /// Turn stored data into engine state.
    ///
    /// Missing ids are generated (`p-<n>`, `t-<n>`), missing names become
    /// "Unknown Player" / "Unknown Team", missing base prices come from the
    /// category preset, missing budgets from the initial budget, missing
    /// winning bids read as 0 and negative amounts clamp to 0. Unsold entries
    /// without a player are dropped.
    pub fn hydrate(self, rules: &AuctionRules) -> Hydrated {
        let category_base = CategoryBase::from(self.category_base);

        let player_ids: HashSet<String> = self
            .players
            .iter()
            .chain(self.teams.iter().flat_map(|t| t.roster.iter().flatten().map(|e| &e.player)))
            .chain(self.unsold.iter().filter_map(|u| u.player.as_ref()))
            .filter_map(|p| p.id.clone())
            .collect();
        let mut player_alloc = IdAllocator::new("p", player_ids);
        let mut team_alloc =
            IdAllocator::new("t", self.teams.iter().filter_map(|t| t.id.clone()).collect());

        let players: Vec<Player> = self
            .players
            .into_iter()
            .map(|p| hydrate_player(p, &category_base, &mut player_alloc))
            .collect();

        let teams: Vec<Team> = self
            .teams
            .into_iter()
            .map(|stored| {
                let id = stored.id.unwrap_or_else(|| {
                    let id = team_alloc.fresh();
                    warn!("Stored team without id; assigned {}", id);
                    id
                });
                let budget = match stored.budget {
                    Some(b) => clamp_points(b, "Budget", &id),
                    None => rules.initial_budget,
                };
                let roster = stored
                    .roster
                    .unwrap_or_default()
                    .into_iter()
                    .map(|entry| {
                        let player = hydrate_player(entry.player, &category_base, &mut player_alloc);
                        let winning_bid = match entry.winning_bid {
                            Some(bid) => clamp_points(bid, "Winning bid", &player.id),
                            None => {
                                warn!("Roster entry {} on {} has no winning bid; using 0", player.id, id);
                                0
                            }
                        };
                        RosterEntry {
                            player,
                            winning_bid,
                        }
                    })
                    .collect();
                Team {
                    name: stored.name.unwrap_or_else(|| "Unknown Team".to_string()),
                    budget,
                    roster,
                    logo: stored.logo,
                    id,
                }
            })
            .collect();

        let index = crate::model::assignments(&teams);
        let rostered: usize = teams.iter().map(|t| t.roster.len()).sum();
        if index.len() != rostered {
            warn!(
                "Snapshot lists {} roster entries for {} distinct players",
                rostered,
                index.len()
            );
        }

        let unsold = self
            .unsold
            .into_iter()
            .filter_map(|entry| {
                let Some(player) = entry.player else {
                    warn!("Dropping unsold record without a player");
                    return None;
                };
                Some(UnsoldEntry {
                    player: hydrate_player(player, &category_base, &mut player_alloc),
                    timestamp: entry.timestamp.unwrap_or(0),
                })
            })
            .collect();

        Hydrated {
            players,
            teams,
            category_base,
            unsold,
        }
    }
}
