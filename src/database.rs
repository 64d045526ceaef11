//! Player statistics storage
//!
//! Uses SQLite to keep every stat snapshot players record

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid stats JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("Lock error")]
    LockError,
}

/// One stat snapshot of a player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub guild_id: u64,
    pub user_id: u64,
    pub player_name: String,
    /// Free text as the player typed it
    pub time_zone: Option<String>,
    /// Arbitrary statistics such as `power` and `level`
    pub stats: Map<String, Value>,
    pub recorded_at: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn stat_i64(&self, key: &str) -> Option<i64> {
        self.stats.get(key).and_then(Value::as_i64)
    }
}

/// Row as stored, before JSON and timestamp decoding
struct RecordRow {
    guild_id: u64,
    user_id: u64,
    player_name: String,
    time_zone: Option<String>,
    stats: String,
    recorded_at: String,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            guild_id: row.get(0)?,
            user_id: row.get(1)?,
            player_name: row.get(2)?,
            time_zone: row.get(3)?,
            stats: row.get(4)?,
            recorded_at: row.get(5)?,
        })
    }

    fn into_record(self) -> Result<PlayerRecord, DatabaseError> {
        Ok(PlayerRecord {
            guild_id: self.guild_id,
            user_id: self.user_id,
            player_name: self.player_name,
            time_zone: self.time_zone,
            stats: serde_json::from_str(&self.stats)?,
            recorded_at: DateTime::parse_from_rfc3339(&self.recorded_at)?.with_timezone(&Utc),
        })
    }
}

const RECORD_COLUMNS: &str = "guild_id, user_id, player_name, time_zone, stats, recorded_at";

/// Database connection wrapper
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Initialize database tables
    fn init(&self) -> Result<(), DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockError)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS player_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guild_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                player_name TEXT NOT NULL,
                time_zone TEXT,
                stats TEXT NOT NULL DEFAULT '{}',
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_player_records_player
                ON player_records (guild_id, user_id, id);",
        )?;
        Ok(())
    }

    /// Store a new snapshot. Earlier snapshots are kept as history.
    pub fn insert_record(&self, record: &PlayerRecord) -> Result<i64, DatabaseError> {
        let stats = serde_json::to_string(&record.stats)?;
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockError)?;
        conn.execute(
            "INSERT INTO player_records
             (guild_id, user_id, player_name, time_zone, stats, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.guild_id,
                record.user_id,
                record.player_name,
                record.time_zone,
                stats,
                record.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent snapshot of one player
    pub fn latest_record(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<PlayerRecord>, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockError)?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM player_records
                     WHERE guild_id = ? AND user_id = ?
                     ORDER BY id DESC LIMIT 1",
                    RECORD_COLUMNS
                ),
                params![guild_id, user_id],
                RecordRow::from_row,
            )
            .optional()?;

        row.map(RecordRow::into_record).transpose()
    }

    /// Most recent snapshot of every player in a guild, ordered by name
    pub fn latest_records(&self, guild_id: u64) -> Result<Vec<PlayerRecord>, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockError)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM player_records AS r
             WHERE r.guild_id = ?1
               AND r.id = (SELECT MAX(id) FROM player_records
                           WHERE guild_id = ?1 AND user_id = r.user_id)
             ORDER BY r.player_name COLLATE NOCASE",
            RECORD_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![guild_id], RecordRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }

    /// Snapshots of one player, newest first
    pub fn player_history(
        &self,
        guild_id: u64,
        user_id: u64,
        limit: usize,
    ) -> Result<Vec<PlayerRecord>, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockError)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM player_records
             WHERE guild_id = ? AND user_id = ?
             ORDER BY id DESC LIMIT ?",
            RECORD_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![guild_id, user_id, limit], RecordRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(guild_id: u64, user_id: u64, name: &str, time_zone: Option<&str>) -> PlayerRecord {
        PlayerRecord {
            guild_id,
            user_id,
            player_name: name.to_string(),
            time_zone: time_zone.map(str::to_string),
            stats: Map::new(),
            recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_latest_record() {
        let db = Database::open(":memory:").unwrap();
        assert!(db.latest_record(1, 10).unwrap().is_none());

        db.insert_record(&record(1, 10, "Aria", Some("EST"))).unwrap();
        db.insert_record(&record(1, 10, "Aria", Some("CET"))).unwrap();

        let latest = db.latest_record(1, 10).unwrap().unwrap();
        assert_eq!(latest.time_zone.as_deref(), Some("CET"));
        assert_eq!(
            latest.recorded_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_latest_records_one_per_player() {
        let db = Database::open(":memory:").unwrap();
        db.insert_record(&record(1, 10, "bram", Some("EST"))).unwrap();
        db.insert_record(&record(1, 20, "Aria", None)).unwrap();
        db.insert_record(&record(1, 10, "bram", Some("PST"))).unwrap();
        db.insert_record(&record(2, 30, "Other", Some("JST"))).unwrap();

        let latest = db.latest_records(1).unwrap();
        let names: Vec<&str> = latest.iter().map(|r| r.player_name.as_str()).collect();
        assert_eq!(names, vec!["Aria", "bram"]);
        assert_eq!(latest[0].time_zone, None);
        assert_eq!(latest[1].time_zone.as_deref(), Some("PST"));
    }

    #[test]
    fn test_stats_are_preserved() {
        let db = Database::open(":memory:").unwrap();
        let mut rec = record(1, 10, "Aria", None);
        rec.stats.insert("power".to_string(), json!(1_250_000));
        rec.stats.insert("level".to_string(), json!(27));
        db.insert_record(&rec).unwrap();

        let stored = db.latest_record(1, 10).unwrap().unwrap();
        assert_eq!(stored.stat_i64("power"), Some(1_250_000));
        assert_eq!(stored.stat_i64("level"), Some(27));
        assert_eq!(stored.stat_i64("kills"), None);
    }

    #[test]
    fn test_player_history_newest_first() {
        let db = Database::open(":memory:").unwrap();
        for power in [100, 200, 300] {
            let mut rec = record(1, 10, "Aria", None);
            rec.stats.insert("power".to_string(), json!(power));
            db.insert_record(&rec).unwrap();
        }

        let history = db.player_history(1, 10, 2).unwrap();
        let powers: Vec<Option<i64>> = history.iter().map(|r| r.stat_i64("power")).collect();
        assert_eq!(powers, vec![Some(300), Some(200)]);
        assert!(db.player_history(1, 99, 2).unwrap().is_empty());
    }
}
