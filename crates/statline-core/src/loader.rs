// Season stats CSV loading and bootstrap into the record store.
//
// Expected header: season,player_name,team,gp,toi,shots,goals,assists,points,scouting_grade
// where `toi` is total time on ice as "minutes:seconds" (e.g. "1732:15").

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::db::Database;
use crate::record::PlayerSeasonRecord;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("failed to store records: {0:#}")]
    Store(anyhow::Error),
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawStatRow {
    season: i32,
    player_name: String,
    team: String,
    gp: u32,
    toi: String,
    shots: u32,
    goals: u32,
    assists: u32,
    points: u32,
    scouting_grade: i32,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Convert a "minutes:seconds" time-on-ice value to total seconds.
///
/// A single trailing `.` is tolerated (some exports write "1732:15.").
/// Returns `None` for anything else that isn't two non-negative integers
/// separated by a colon.
pub fn parse_time_on_ice(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    let (minutes, seconds) = trimmed.split_once(':')?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: u32 = seconds.trim().parse().ok()?;
    minutes.checked_mul(60)?.checked_add(seconds)
}

// ---------------------------------------------------------------------------
// Reader-based loader (enables testing without temp files)
// ---------------------------------------------------------------------------

/// Parse stat rows from any reader. Malformed rows are skipped with a
/// warning rather than failing the whole import.
pub fn load_records_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerSeasonRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut records = Vec::new();
    for result in reader.deserialize::<RawStatRow>() {
        match result {
            Ok(raw) => {
                let Some(toi) = parse_time_on_ice(&raw.toi) else {
                    warn!(
                        "skipping '{}' ({}): unparseable toi '{}'",
                        raw.player_name, raw.season, raw.toi
                    );
                    continue;
                };
                records.push(PlayerSeasonRecord {
                    season: raw.season,
                    player_name: raw.player_name,
                    team: raw.team,
                    games_played: raw.gp,
                    time_on_ice_seconds: toi,
                    shots: raw.shots,
                    goals: raw.goals,
                    assists: raw.assists,
                    points: raw.points,
                    scouting_grade: raw.scouting_grade,
                });
            }
            Err(e) => {
                warn!("skipping malformed stats row: {}", e);
            }
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Path-based loaders
// ---------------------------------------------------------------------------

/// Load season records from a CSV file.
pub fn load_records(path: &Path) -> Result<Vec<PlayerSeasonRecord>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_records_from_reader(file).map_err(|e| LoadError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Populate `db` from the CSV at `path` if it holds no records yet.
///
/// Returns the number of records imported (0 when the store was already
/// populated and the CSV was not read).
pub fn bootstrap_if_empty(db: &Database, path: &Path) -> Result<usize, LoadError> {
    let existing = db.record_count().map_err(LoadError::Store)?;
    if existing > 0 {
        info!("Record store already holds {existing} records; skipping CSV import");
        return Ok(0);
    }

    let records = load_records(path)?;
    if records.is_empty() {
        return Err(LoadError::Validation(format!(
            "{} produced zero valid rows",
            path.display()
        )));
    }

    db.insert_records(&records).map_err(LoadError::Store)?;
    info!("Imported {} records from {}", records.len(), path.display());
    Ok(records.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
