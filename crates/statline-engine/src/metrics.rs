// Per-game and efficiency ratios for a single season record.
//
// Every ratio shares one policy: a zero denominator yields exactly 0.0.

use serde::Serialize;
use statline_core::PlayerSeasonRecord;

use crate::teams::team_full_name;

/// Decimal places for per-game rates.
pub const PER_GAME_DECIMALS: i32 = 2;

/// Decimal places for shooting percentage.
pub const SHOOTING_PCT_DECIMALS: i32 = 1;

/// Round `value` to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `round(numerator / denominator * scale, decimals)`, or `0.0` when the
/// denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64, scale: f64, decimals: i32) -> f64 {
    if denominator > 0.0 {
        round_to(numerator / denominator * scale, decimals)
    } else {
        0.0
    }
}

/// `count / games`, rounded to two places.
pub fn per_game(count: u64, games: u64) -> f64 {
    ratio(count as f64, games as f64, 1.0, PER_GAME_DECIMALS)
}

/// `goals / shots * 100`, rounded to one place.
pub fn shooting_percentage(goals: u64, shots: u64) -> f64 {
    ratio(goals as f64, shots as f64, 100.0, SHOOTING_PCT_DECIMALS)
}

/// Display ratios derived from one record. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub toi_per_game: f64,
    pub goals_per_game: f64,
    pub assists_per_game: f64,
    pub points_per_game: f64,
    pub shots_per_game: f64,
    pub shooting_percentage: f64,
}

impl DerivedMetrics {
    pub fn from_record(record: &PlayerSeasonRecord) -> Self {
        let gp = u64::from(record.games_played);
        Self {
            toi_per_game: per_game(u64::from(record.time_on_ice_seconds), gp),
            goals_per_game: per_game(u64::from(record.goals), gp),
            assists_per_game: per_game(u64::from(record.assists), gp),
            points_per_game: per_game(u64::from(record.points), gp),
            shots_per_game: per_game(u64::from(record.shots), gp),
            shooting_percentage: shooting_percentage(
                u64::from(record.goals),
                u64::from(record.shots),
            ),
        }
    }
}

/// A record flattened together with its derived metrics and the club's
/// display name, as served by the record listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatLine {
    #[serde(flatten)]
    pub record: PlayerSeasonRecord,
    pub team_full_name: &'static str,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

impl StatLine {
    pub fn from_record(record: PlayerSeasonRecord) -> Self {
        let metrics = DerivedMetrics::from_record(&record);
        let team_full_name = team_full_name(&record.team);
        Self {
            record,
            team_full_name,
            metrics,
        }
    }
}
