//! SQLite match store
//!
//! Holds cleaned match records between `data import` and `train`.

use crate::{MatchRecord, MatchResult, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Stored in place of a missing date so the unique key stays usable
const UNDATED: &str = "";

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                season TEXT NOT NULL,
                home_team_id INTEGER NOT NULL REFERENCES teams(id),
                away_team_id INTEGER NOT NULL REFERENCES teams(id),
                home_goals INTEGER NOT NULL,
                away_goals INTEGER NOT NULL,
                result TEXT NOT NULL,
                source_order INTEGER NOT NULL,
                UNIQUE(season, date, home_team_id, away_team_id)
            );

            CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
            "#,
        )?;
        Ok(())
    }

    // ==================== Team Operations ====================

    /// All team names, sorted
    pub fn get_team_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM teams ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    // ==================== Match Operations ====================

    /// Insert or update a match record
    pub fn upsert_match(&self, record: &MatchRecord) -> Result<()> {
        upsert_record(&self.conn, record)
    }

    /// Insert multiple match records in one transaction
    pub fn upsert_matches(&mut self, records: &[MatchRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for record in records {
            upsert_record(&tx, record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Get all matches in chronological order (undated first)
    pub fn get_all_matches(&self) -> Result<Vec<MatchRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.date, m.season, h.name, a.name, m.home_goals, m.away_goals,
                    m.result, m.source_order
             FROM matches m
             JOIN teams h ON h.id = m.home_team_id
             JOIN teams a ON a.id = m.away_team_id
             ORDER BY m.date, m.source_order, m.id",
        )?;

        let matches = stmt
            .query_map([], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(matches)
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<MatchRecord> {
        let date_str: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").ok();

        let result_str: String = row.get(6)?;
        let result = MatchResult::from_code(&result_str).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(6, "result".to_string(), rusqlite::types::Type::Text)
        })?;
        let source_order: i64 = row.get(7)?;

        Ok(MatchRecord {
            date,
            season: row.get(1)?,
            home_team: row.get(2)?,
            away_team: row.get(3)?,
            home_goals: row.get(4)?,
            away_goals: row.get(5)?,
            result,
            source_order: source_order.max(0) as usize,
        })
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let team_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM teams", [], |row| row.get(0))?;

        let match_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;

        let season_count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT season) FROM matches",
            [],
            |row| row.get(0),
        )?;

        let min_date: Option<String> = self
            .conn
            .query_row(
                "SELECT MIN(date) FROM matches WHERE date != ''",
                [],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let max_date: Option<String> = self
            .conn
            .query_row("SELECT MAX(date) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            team_count: team_count as usize,
            match_count: match_count as usize,
            season_count: season_count as usize,
            earliest_match: min_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            latest_match: max_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        })
    }
}

/// Get or create a team row by canonical name
fn team_row_id(conn: &Connection, name: &str) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM teams WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute("INSERT INTO teams (name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

fn upsert_record(conn: &Connection, record: &MatchRecord) -> Result<()> {
    let home_id = team_row_id(conn, &record.home_team)?;
    let away_id = team_row_id(conn, &record.away_team)?;
    let date = record
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNDATED.to_string());

    conn.execute(
        r#"
        INSERT INTO matches (date, season, home_team_id, away_team_id,
                             home_goals, away_goals, result, source_order)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(season, date, home_team_id, away_team_id) DO UPDATE SET
            home_goals = excluded.home_goals,
            away_goals = excluded.away_goals,
            result = excluded.result,
            source_order = excluded.source_order
        "#,
        params![
            date,
            record.season,
            home_id,
            away_id,
            record.home_goals,
            record.away_goals,
            record.result.code().to_string(),
            record.source_order as i64,
        ],
    )?;
    Ok(())
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub team_count: usize,
    pub match_count: usize,
    pub season_count: usize,
    pub earliest_match: Option<NaiveDate>,
    pub latest_match: Option<NaiveDate>,
}
