// SQLite persistence layer for auction state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use auction_core::resolver::SaleReceipt;
use auction_core::AuctionSnapshot;

/// A completed sale as recorded in the audit table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRow {
    pub player_id: String,
    pub player_name: String,
    pub team_id: String,
    pub team_name: String,
    pub amount: u64,
    pub timestamp: String,
}

/// SQLite-backed persistence for the auction snapshot and a sale history.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Key under which the engine snapshot is stored in `auction_state`.
    pub const SNAPSHOT_KEY: &'static str = "snapshot";

    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS auction_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sales (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                player_id   TEXT NOT NULL,
                player_name TEXT NOT NULL,
                team_id     TEXT NOT NULL,
                team_name   TEXT NOT NULL,
                amount      INTEGER NOT NULL,
                timestamp   TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-statement;
        // SQLite itself is still consistent.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    /// Store a JSON value under `key`, replacing any previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO auction_state (key, value) VALUES (?1, ?2)",
                params![key, json_str],
            )
            .context("failed to save state")?;
        Ok(())
    }

    /// Load the JSON value stored under `key`, if any.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM auction_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query auction state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value = serde_json::from_str(&json_str)
                    .with_context(|| format!("failed to parse stored value for {key}"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Replace the stored snapshot.
    pub fn save_snapshot(&self, snapshot: &AuctionSnapshot) -> Result<()> {
        let value = serde_json::to_value(snapshot).context("failed to serialize snapshot")?;
        self.save_state(Self::SNAPSHOT_KEY, &value)
    }

    /// Load the stored snapshot, or `None` on a fresh database.
    pub fn load_snapshot(&self) -> Result<Option<AuctionSnapshot>> {
        self.load_state(Self::SNAPSHOT_KEY)?
            .map(|value| serde_json::from_value(value).context("failed to deserialize snapshot"))
            .transpose()
    }

    // ------------------------------------------------------------------
    // Sales audit
    // ------------------------------------------------------------------

    pub fn record_sale(&self, sale: &SaleReceipt) -> Result<()> {
        let amount = i64::try_from(sale.bid).context("sale amount out of range")?;
        self.conn()
            .execute(
                "INSERT INTO sales (player_id, player_name, team_id, team_name, amount, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    sale.player_id,
                    sale.player_name,
                    sale.team_id,
                    sale.team_name,
                    amount,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )
            .context("failed to record sale")?;
        Ok(())
    }

    /// All recorded sales, oldest first.
    pub fn load_sales(&self) -> Result<Vec<SaleRow>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player_id, player_name, team_id, team_name, amount, timestamp
                 FROM sales ORDER BY id",
            )
            .context("failed to prepare load_sales query")?;

        let sales = stmt
            .query_map([], |row| {
                let amount: i64 = row.get(4)?;
                Ok(SaleRow {
                    player_id: row.get(0)?,
                    player_name: row.get(1)?,
                    team_id: row.get(2)?,
                    team_name: row.get(3)?,
                    amount: amount.max(0) as u64,
                    timestamp: row.get(5)?,
                })
            })
            .context("failed to query sales")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read sale rows")?;
        Ok(sales)
    }

    /// Remove the snapshot and the sale history in one transaction.
    pub fn clear_all(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM sales", [])
            .context("failed to delete sales")?;
        tx.execute("DELETE FROM auction_state", [])
            .context("failed to delete auction state")?;
        tx.commit().context("failed to commit clear_all")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use auction_core::pool::NewPlayer;
    use auction_core::{AuctionEngine, AuctionRules, Category};

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn sample_sale(player: &str, bid: u64) -> SaleReceipt {
        SaleReceipt {
            player_id: format!("p-{player}"),
            player_name: player.to_string(),
            team_id: "t-1".into(),
            team_name: "Strikers".into(),
            team_logo: None,
            bid,
        }
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('auction_state', 'sales')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn load_snapshot_on_fresh_db_is_none() {
        assert!(test_db().load_snapshot().unwrap().is_none());
    }

    #[test]
    fn snapshot_round_trips_through_sqlite() {
        let db = test_db();
        let mut engine = AuctionEngine::new(AuctionRules::default());
        engine.add_team("Strikers");
        let id = engine.add_player(NewPlayer {
            name: "Asha".into(),
            category: Some(Category::Elite),
            ..NewPlayer::default()
        });
        engine.send_to_auction(&id).unwrap();
        engine.place_bid("t-1", 15_000).unwrap();
        engine.finalize_sale().unwrap();

        db.save_snapshot(&engine.serialize()).unwrap();
        let loaded = db.load_snapshot().unwrap().unwrap();
        let restored = AuctionEngine::init(AuctionRules::default(), loaded);
        assert_eq!(restored.teams(), engine.teams());
        assert_eq!(restored.owner_of(&id), Some("Strikers"));
    }

    #[test]
    fn save_snapshot_overwrites_previous() {
        let db = test_db();
        let mut engine = AuctionEngine::new(AuctionRules::default());
        db.save_snapshot(&engine.serialize()).unwrap();
        engine.add_team("Royals");
        db.save_snapshot(&engine.serialize()).unwrap();

        let loaded = db.load_snapshot().unwrap().unwrap();
        assert_eq!(loaded.teams.len(), 1);
    }

    #[test]
    fn sparse_snapshot_rows_still_load() {
        let db = test_db();
        db.save_state(
            Database::SNAPSHOT_KEY,
            &serde_json::json!({
                "players": [{ "role": "Bowler" }],
                "teams": [{ "name": "Strikers", "roster": [{ "name": "Ravi" }] }]
            }),
        )
        .unwrap();

        let loaded = db.load_snapshot().unwrap().unwrap();
        let restored = AuctionEngine::init(AuctionRules::default(), loaded);
        assert_eq!(restored.players()[0].name, "Unknown Player");
        assert_eq!(restored.teams()[0].roster[0].winning_bid, 0);
    }

    #[test]
    fn sales_are_returned_in_order() {
        let db = test_db();
        db.record_sale(&sample_sale("Asha", 15_000)).unwrap();
        db.record_sale(&sample_sale("Ravi", 9_000)).unwrap();

        let sales = db.load_sales().unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].player_name, "Asha");
        assert_eq!(sales[0].amount, 15_000);
        assert_eq!(sales[1].player_id, "p-Ravi");
        assert!(chrono::DateTime::parse_from_rfc3339(&sales[1].timestamp).is_ok());
    }

    #[test]
    fn clear_all_removes_everything() {
        let db = test_db();
        db.save_snapshot(&AuctionSnapshot::default()).unwrap();
        db.record_sale(&sample_sale("Asha", 15_000)).unwrap();

        db.clear_all().unwrap();
        assert!(db.load_snapshot().unwrap().is_none());
        assert!(db.load_sales().unwrap().is_empty());
    }
}
