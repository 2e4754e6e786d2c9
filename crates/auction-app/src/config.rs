// Configuration loading and parsing (auction.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use auction_core::{AuctionRules, Category, CategoryBase};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub rules: AuctionRules,
    pub category_base: CategoryBase,
    /// Teams created when the database holds no saved auction.
    pub team_names: Vec<String>,
    pub db_path: String,
    /// CSV file seeding the player pool on a fresh database.
    pub player_pool: Option<String>,
}

// ---------------------------------------------------------------------------
// auction.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire auction.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AuctionFile {
    auction: RulesSection,
    #[serde(default)]
    categories: BTreeMap<String, u64>,
    #[serde(default)]
    teams: TeamsSection,
    database: DatabaseSection,
    #[serde(default)]
    data: DataSection,
}

#[derive(Debug, Clone, Deserialize)]
struct RulesSection {
    bid_increment: u64,
    roster_cap: usize,
    initial_budget: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TeamsSection {
    #[serde(default)]
    names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DataSection {
    player_pool: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/auction.toml` relative to
/// `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` which does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("auction.toml");
    let text = read_file(&path)?;
    let file: AuctionFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let mut categories = BTreeMap::new();
    for (key, value) in file.categories {
        let category =
            Category::from_str_cat(&key).ok_or_else(|| ConfigError::ValidationError {
                field: format!("categories.{key}"),
                message: "unknown category".into(),
            })?;
        categories.insert(category, value);
    }

    let config = Config {
        rules: AuctionRules {
            bid_increment: file.auction.bid_increment,
            roster_cap: file.auction.roster_cap,
            initial_budget: file.auction.initial_budget,
        },
        category_base: CategoryBase::from(categories),
        team_names: file.teams.names,
        db_path: file.database.path,
        player_pool: file.data.player_pool.filter(|p| !p.trim().is_empty()),
    };

    validate(&config)?;

    Ok(config)
}

/// Files the console reads from `config/`, each shipped under `defaults/`.
const CONFIG_FILES: &[&str] = &["auction.toml"];

/// Seed `config/` from `defaults/` for every config file the console reads.
/// Returns the paths written. A file already present in `config/` is never
/// touched, so operator edits survive upgrades.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let mut written = Vec::new();

    for name in CONFIG_FILES {
        let target = config_dir.join(name);
        if target.is_file() {
            continue;
        }
        let source = base_dir.join("defaults").join(name);
        if !source.is_file() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "{} is missing and no default exists at {}",
                    target.display(),
                    source.display()
                ),
            });
        }
        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", config_dir.display()),
        })?;
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
        })?;
        written.push(target);
    }

    Ok(written)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let positive: &[(&str, u64)] = &[
        ("auction.bid_increment", config.rules.bid_increment),
        ("auction.roster_cap", config.rules.roster_cap as u64),
        ("auction.initial_budget", config.rules.initial_budget),
    ];
    for (name, val) in positive {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be greater than 0".into(),
            });
        }
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    /// Fresh temp dir with `config/auction.toml` holding `contents`.
    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/auction.toml"), contents).unwrap();
        tmp
    }

    fn default_toml() -> String {
        fs::read_to_string(project_root().join("defaults/auction.toml")).unwrap()
    }

    #[test]
    fn load_defaults_file() {
        let tmp = temp_config("auction_config_defaults", &default_toml());
        let config = load_config_from(&tmp).expect("default config should load");

        assert_eq!(config.rules, AuctionRules::default());
        assert_eq!(config.category_base.get(Category::Legends), 20_000);
        assert_eq!(config.category_base.get(Category::RisingStars), 10_000);
        assert_eq!(config.category_base.get(Category::Unsold), 0);
        assert_eq!(config.db_path, "auction.db");
        assert!(!config.team_names.is_empty());
        assert_eq!(config.player_pool.as_deref(), Some("data/players.csv"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn optional_sections_may_be_omitted() {
        let tmp = temp_config(
            "auction_config_minimal",
            r#"
[auction]
bid_increment = 500
roster_cap = 11
initial_budget = 100000

[database]
path = "league.db"
"#,
        );
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.rules.bid_increment, 500);
        assert_eq!(config.rules.roster_cap, 11);
        assert!(config.team_names.is_empty());
        assert_eq!(config.category_base.get(Category::Elite), 15_000);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_increment() {
        let tmp = temp_config(
            "auction_config_zero_increment",
            &default_toml().replace("bid_increment = 1000", "bid_increment = 0"),
        );
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "auction.bid_increment");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_category() {
        let tmp = temp_config(
            "auction_config_bad_category",
            &default_toml().replace("\"Elite\" = 15000", "\"Captains\" = 15000"),
        );
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "categories.Captains");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let tmp = temp_config("auction_config_malformed", "[auction\nbid_increment = ");
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_file_reports_path() {
        let tmp = std::env::temp_dir().join("auction_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("auction.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn ensure_config_files_copies_once() {
        let tmp = std::env::temp_dir().join("auction_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults/auction.toml"),
            tmp.join("defaults/auction.toml"),
        )
        .unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config/auction.toml").exists());

        let copied_again = ensure_config_files(&tmp).unwrap();
        assert!(copied_again.is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_keeps_operator_edits() {
        let tmp = temp_config("auction_config_keep_edits", "# edited by hand\n");
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults/auction.toml"),
            tmp.join("defaults/auction.toml"),
        )
        .unwrap();

        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(tmp.join("config/auction.toml")).unwrap(),
            "# edited by hand\n"
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_any_dirs_fails() {
        let tmp = std::env::temp_dir().join("auction_config_nothing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_files(&tmp).unwrap_err(),
            ConfigError::DefaultsCopyError { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }
}
