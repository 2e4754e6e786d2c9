// Player pool import from CSV.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use auction_core::pool::NewPlayer;
use auction_core::Category;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

// ---------------------------------------------------------------------------
// Raw CSV row
// ---------------------------------------------------------------------------

/// One line of `name,role,category,base_price,image,stats_image`. Empty
/// optional cells read as `None`.
#[derive(Debug, Deserialize)]
struct RawPlayer {
    name: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    base_price: Option<u64>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    stats_image: Option<String>,
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Rows that fail to deserialize are skipped with a warning; a recognisable
/// row naming an unknown category is an error. `origin` labels CSV errors.
fn load_players_from_reader<R: Read>(rdr: R, origin: &str) -> Result<Vec<NewPlayer>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    reader.headers().map_err(|e| ImportError::Csv {
        path: origin.to_string(),
        source: e,
    })?;
    let mut players = Vec::new();
    for (idx, result) in reader.deserialize::<RawPlayer>().enumerate() {
        // Header is line 1.
        let row = idx + 2;
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row {}: {}", row, e);
                continue;
            }
        };
        if raw.name.is_empty() {
            warn!("skipping player row {} with no name", row);
            continue;
        }

        let category = match raw.category.as_deref() {
            None => None,
            Some(s) => Some(Category::from_str_cat(s).ok_or_else(|| ImportError::InvalidRow {
                row,
                message: format!("unknown category '{s}' for {}", raw.name),
            })?),
        };

        players.push(NewPlayer {
            name: raw.name,
            role: raw.role,
            category,
            base_price: raw.base_price,
            image: raw.image,
            stats_image: raw.stats_image,
        });
    }
    Ok(players)
}

/// Load a player pool from a CSV file.
pub fn load_player_pool(path: &Path) -> Result<Vec<NewPlayer>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_players_from_reader(file, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
