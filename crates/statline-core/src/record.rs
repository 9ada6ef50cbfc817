// Season stat records and the filter used to select them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// PlayerSeasonRecord
// ---------------------------------------------------------------------------

/// One player's stat line for one season.
///
/// Records are loaded once at bootstrap and treated as read-only afterwards.
/// None of the numeric fields are checked for internal consistency (points
/// need not equal goals + assists, games may be zero).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeasonRecord {
    pub season: i32,
    /// "Last, First" by convention; never validated.
    pub player_name: String,
    /// Three-letter club code (e.g. `TOR`).
    pub team: String,
    pub games_played: u32,
    pub time_on_ice_seconds: u32,
    pub shots: u32,
    pub goals: u32,
    pub assists: u32,
    pub points: u32,
    pub scouting_grade: i32,
}

// ---------------------------------------------------------------------------
// RecordFilter
// ---------------------------------------------------------------------------

/// Optional season and player-name restrictions, composed conjunctively.
///
/// An empty player set means "no player filter", the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub season: Option<i32>,
    pub players: Option<BTreeSet<String>>,
}

impl RecordFilter {
    /// Filter that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a single season.
    pub fn season(season: i32) -> Self {
        Self {
            season: Some(season),
            players: None,
        }
    }

    /// Builder-style season setter that accepts an optional value.
    pub fn with_season(mut self, season: Option<i32>) -> Self {
        self.season = season;
        self
    }

    /// Builder-style player restriction. Passing an empty iterator leaves
    /// the filter unrestricted by name.
    pub fn with_players<I, S>(mut self, players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = players.into_iter().map(Into::into).collect();
        self.players = if set.is_empty() { None } else { Some(set) };
        self
    }

    /// The player set, if it actually restricts anything.
    pub fn player_set(&self) -> Option<&BTreeSet<String>> {
        self.players.as_ref().filter(|set| !set.is_empty())
    }

    /// Returns true if the record passes both the season and player filters.
    pub fn matches(&self, record: &PlayerSeasonRecord) -> bool {
        let season_ok = self.season.is_none_or(|s| s == record.season);
        let player_ok = self
            .player_set()
            .is_none_or(|set| set.contains(&record.player_name));
        season_ok && player_ok
    }
}
