// Head-to-head comparison of two players over one or more seasons.
//
// Each player's seasons are summed into a summary, rates are derived from the
// summed totals, and four criteria vote on a winner. A criterion whose values
// are exactly equal is a tie and awards no win to either side.

use std::collections::BTreeMap;

use serde::Serialize;
use statline_core::PlayerSeasonRecord;
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::metrics::{per_game, round_to, shooting_percentage};

/// Decimal places for the averaged scouting grade.
const AVG_GRADE_DECIMALS: i32 = 1;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Multi-season totals and rates for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHeadSummary {
    pub player_name: String,
    pub seasons: usize,
    pub games_played: u64,
    pub goals: u64,
    pub assists: u64,
    pub points: u64,
    pub shots: u64,
    pub time_on_ice_seconds: u64,
    pub points_per_game: f64,
    pub goals_per_game: f64,
    pub assists_per_game: f64,
    pub shooting_percentage: f64,
    pub toi_per_game: f64,
    pub avg_scouting_grade: f64,
}

impl HeadToHeadSummary {
    /// Sum `records` (all belonging to `player_name`) into a summary.
    ///
    /// Rates use the summed denominators, not an average of per-season
    /// rates. An empty slice yields an all-zero summary.
    pub fn from_records<'a, I>(player_name: &str, records: I) -> Self
    where
        I: IntoIterator<Item = &'a PlayerSeasonRecord>,
    {
        let mut s = HeadToHeadSummary {
            player_name: player_name.to_string(),
            seasons: 0,
            games_played: 0,
            goals: 0,
            assists: 0,
            points: 0,
            shots: 0,
            time_on_ice_seconds: 0,
            points_per_game: 0.0,
            goals_per_game: 0.0,
            assists_per_game: 0.0,
            shooting_percentage: 0.0,
            toi_per_game: 0.0,
            avg_scouting_grade: 0.0,
        };
        let mut grade_total: i64 = 0;

        for r in records {
            s.seasons += 1;
            s.games_played += u64::from(r.games_played);
            s.goals += u64::from(r.goals);
            s.assists += u64::from(r.assists);
            s.points += u64::from(r.points);
            s.shots += u64::from(r.shots);
            s.time_on_ice_seconds += u64::from(r.time_on_ice_seconds);
            grade_total += i64::from(r.scouting_grade);
        }

        s.points_per_game = per_game(s.points, s.games_played);
        s.goals_per_game = per_game(s.goals, s.games_played);
        s.assists_per_game = per_game(s.assists, s.games_played);
        s.toi_per_game = per_game(s.time_on_ice_seconds, s.games_played);
        s.shooting_percentage = shooting_percentage(s.goals, s.shots);
        if s.seasons > 0 {
            s.avg_scouting_grade =
                round_to(grade_total as f64 / s.seasons as f64, AVG_GRADE_DECIMALS);
        }
        s
    }
}

// ---------------------------------------------------------------------------
// Criteria and verdicts
// ---------------------------------------------------------------------------

/// The four voting criteria. Higher is better for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    TotalPoints,
    PointsPerGame,
    ShootingPercentage,
    AvgScoutingGrade,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::TotalPoints,
        Criterion::PointsPerGame,
        Criterion::ShootingPercentage,
        Criterion::AvgScoutingGrade,
    ];

    /// The summary value this criterion compares.
    pub fn value(&self, summary: &HeadToHeadSummary) -> f64 {
        match self {
            Criterion::TotalPoints => summary.points as f64,
            Criterion::PointsPerGame => summary.points_per_game,
            Criterion::ShootingPercentage => summary.shooting_percentage,
            Criterion::AvgScoutingGrade => summary.avg_scouting_grade,
        }
    }
}

/// Outcome of a single criterion or of the whole comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "player", rename_all = "snake_case")]
pub enum Verdict {
    Winner(String),
    Tie,
}

impl Verdict {
    pub fn winner(&self) -> Option<&str> {
        match self {
            Verdict::Winner(name) => Some(name),
            Verdict::Tie => None,
        }
    }
}

/// Both players' values for one criterion and who took it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionResult {
    pub player1_value: f64,
    pub player2_value: f64,
    pub outcome: Verdict,
}

/// Criteria won by each side. Tied criteria count for neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WinTally {
    pub player1: u32,
    pub player2: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub player1: HeadToHeadSummary,
    pub player2: HeadToHeadSummary,
    pub criteria: BTreeMap<Criterion, CriterionResult>,
    pub wins: WinTally,
    pub winner: Verdict,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Check that `players` names exactly two distinct players and return them.
pub fn validate_pair(players: &[String]) -> Result<(&str, &str)> {
    match players {
        [a, b] if a == b => Err(StatsError::InvalidArgument(format!(
            "cannot compare '{a}' with themself; two distinct players are required"
        ))),
        [a, b] => Ok((a.as_str(), b.as_str())),
        _ => Err(StatsError::InvalidArgument(format!(
            "exactly two players are required for a comparison, got {}",
            players.len()
        ))),
    }
}

/// Vote the four criteria between two summaries.
pub fn vote(player1: HeadToHeadSummary, player2: HeadToHeadSummary) -> ComparisonResult {
    let mut criteria = BTreeMap::new();
    let mut wins = WinTally::default();

    for criterion in Criterion::ALL {
        let v1 = criterion.value(&player1);
        let v2 = criterion.value(&player2);
        let outcome = if v1 > v2 {
            wins.player1 += 1;
            Verdict::Winner(player1.player_name.clone())
        } else if v2 > v1 {
            wins.player2 += 1;
            Verdict::Winner(player2.player_name.clone())
        } else {
            Verdict::Tie
        };
        criteria.insert(
            criterion,
            CriterionResult {
                player1_value: v1,
                player2_value: v2,
                outcome,
            },
        );
    }

    let winner = if wins.player1 > wins.player2 {
        Verdict::Winner(player1.player_name.clone())
    } else if wins.player2 > wins.player1 {
        Verdict::Winner(player2.player_name.clone())
    } else {
        Verdict::Tie
    };

    ComparisonResult {
        player1,
        player2,
        criteria,
        wins,
        winner,
    }
}

/// Compare two players over `records`, optionally restricted to one season.
///
/// `records` may contain other players and seasons; only matching rows are
/// used. Fails with [`StatsError::NotFound`] if either player has no
/// matching rows.
pub fn head_to_head(
    player1: &str,
    player2: &str,
    season: Option<i32>,
    records: &[PlayerSeasonRecord],
) -> Result<ComparisonResult> {
    let in_season = |r: &&PlayerSeasonRecord| season.is_none_or(|s| r.season == s);

    let rows1: Vec<&PlayerSeasonRecord> = records
        .iter()
        .filter(in_season)
        .filter(|r| r.player_name == player1)
        .collect();
    let rows2: Vec<&PlayerSeasonRecord> = records
        .iter()
        .filter(in_season)
        .filter(|r| r.player_name == player2)
        .collect();

    for (name, rows) in [(player1, &rows1), (player2, &rows2)] {
        if rows.is_empty() {
            return Err(StatsError::NotFound(match season {
                Some(s) => format!("no records for '{name}' in season {s}"),
                None => format!("no records for '{name}'"),
            }));
        }
    }

    debug!(
        "Comparing '{}' ({} seasons) with '{}' ({} seasons)",
        player1,
        rows1.len(),
        player2,
        rows2.len()
    );

    let summary1 = HeadToHeadSummary::from_records(player1, rows1);
    let summary2 = HeadToHeadSummary::from_records(player2, rows2);
    Ok(vote(summary1, summary2))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
