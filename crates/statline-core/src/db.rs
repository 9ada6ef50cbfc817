// SQLite persistence layer for season stat records.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use crate::record::{PlayerSeasonRecord, RecordFilter};
use crate::store::RecordStore;

/// Column list shared by every record query, in `row_to_record` order.
const RECORD_COLUMNS: &str =
    "season, player_name, team, gp, toi, shots, goals, assists, points, scouting_grade";

/// SQLite-backed record store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
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
            CREATE TABLE IF NOT EXISTS stats (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                season         INTEGER NOT NULL,
                player_name    TEXT NOT NULL,
                team           TEXT NOT NULL,
                gp             INTEGER NOT NULL,
                toi            INTEGER NOT NULL,
                shots          INTEGER NOT NULL,
                goals          INTEGER NOT NULL,
                assists        INTEGER NOT NULL,
                points         INTEGER NOT NULL,
                scouting_grade INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_stats_season ON stats(season);
            CREATE INDEX IF NOT EXISTS idx_stats_player_name ON stats(player_name);
            CREATE INDEX IF NOT EXISTS idx_stats_team ON stats(team);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Number of stored records.
    pub fn record_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM stats", [], |row| row.get(0))
            .context("failed to count stat records")?;
        Ok(count as usize)
    }

    /// Insert records in a single transaction. Either every row lands or
    /// none do.
    pub fn insert_records(&self, records: &[PlayerSeasonRecord]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO stats
                        (season, player_name, team, gp, toi, shots, goals, assists, points, scouting_grade)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )
                .context("failed to prepare stat insert")?;

            for r in records {
                stmt.execute(params![
                    r.season,
                    r.player_name,
                    r.team,
                    r.games_played,
                    r.time_on_ice_seconds,
                    r.shots,
                    r.goals,
                    r.assists,
                    r.points,
                    r.scouting_grade,
                ])
                .with_context(|| {
                    format!(
                        "failed to insert stat record for {} ({})",
                        r.player_name, r.season
                    )
                })?;
            }
        }

        tx.commit().context("failed to commit import")?;
        Ok(())
    }
}

/// Build the WHERE clause and bound parameters for a filter.
fn filter_clause(filter: &RecordFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(season) = filter.season {
        values.push(Value::Integer(i64::from(season)));
        clauses.push(format!("season = ?{}", values.len()));
    }

    if let Some(players) = filter.player_set() {
        let mut placeholders = Vec::with_capacity(players.len());
        for name in players {
            values.push(Value::Text(name.clone()));
            placeholders.push(format!("?{}", values.len()));
        }
        clauses.push(format!("player_name IN ({})", placeholders.join(", ")));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<PlayerSeasonRecord> {
    Ok(PlayerSeasonRecord {
        season: row.get(0)?,
        player_name: row.get(1)?,
        team: row.get(2)?,
        games_played: row.get(3)?,
        time_on_ice_seconds: row.get(4)?,
        shots: row.get(5)?,
        goals: row.get(6)?,
        assists: row.get(7)?,
        points: row.get(8)?,
        scouting_grade: row.get(9)?,
    })
}

impl RecordStore for Database {
    /// Rows come back in insertion order.
    fn fetch(&self, filter: &RecordFilter) -> Result<Vec<PlayerSeasonRecord>> {
        let conn = self.conn();
        let (where_clause, values) = filter_clause(filter);
        let sql = format!("SELECT {RECORD_COLUMNS} FROM stats{where_clause} ORDER BY id");

        let mut stmt = conn
            .prepare(&sql)
            .context("failed to prepare stat query")?;

        let records = stmt
            .query_map(params_from_iter(values.iter()), row_to_record)
            .context("failed to query stat records")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map stat rows")?;

        Ok(records)
    }

    fn fetch_distinct_names(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT DISTINCT player_name FROM stats")
            .context("failed to prepare distinct name query")?;

        let names = stmt
            .query_map([], |row| row.get(0))
            .context("failed to query player names")?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to map player name rows")?;

        Ok(names)
    }
}
