// Display-ready chart datasets.
//
// Each dataset is a filtered, sorted or grouped projection of season records
// into flat rows. Rows serialize as plain JSON objects so a charting library
// can consume them directly.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statline_core::{PlayerSeasonRecord, RecordFilter};

use crate::metrics::{per_game, ratio, round_to};

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

/// The five available datasets. The kebab-case aliases match the chart
/// route names used by the web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[serde(alias = "total-points", alias = "total_points")]
    GoalsAssists,
    Production,
    #[serde(alias = "shooting-efficiency")]
    ShootingEfficiency,
    #[serde(alias = "per-game-consistency")]
    PerGameConsistency,
    #[serde(alias = "scouting-heatmap")]
    ScoutingHeatmap,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::GoalsAssists,
        ChartKind::Production,
        ChartKind::ShootingEfficiency,
        ChartKind::PerGameConsistency,
        ChartKind::ScoutingHeatmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::GoalsAssists => "goals_assists",
            ChartKind::Production => "production",
            ChartKind::ShootingEfficiency => "shooting_efficiency",
            ChartKind::PerGameConsistency => "per_game_consistency",
            ChartKind::ScoutingHeatmap => "scouting_heatmap",
        }
    }

    /// Whether season/player filters apply to this dataset. The heatmap
    /// always covers the full record set.
    pub fn honors_filters(&self) -> bool {
        !matches!(self, ChartKind::ScoutingHeatmap)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chart kind '{0}'")]
pub struct UnknownChartKind(pub String);

impl FromStr for ChartKind {
    type Err = UnknownChartKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "goals_assists" | "total_points" => Ok(ChartKind::GoalsAssists),
            "production" => Ok(ChartKind::Production),
            "shooting_efficiency" => Ok(ChartKind::ShootingEfficiency),
            "per_game_consistency" => Ok(ChartKind::PerGameConsistency),
            "scouting_heatmap" => Ok(ChartKind::ScoutingHeatmap),
            _ => Err(UnknownChartKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalsAssistsRow {
    pub player_name: String,
    pub team: String,
    pub season: i32,
    pub goals: u32,
    pub assists: u32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionRow {
    pub player_name: String,
    pub team: String,
    pub season: i32,
    pub toi_per_game: f64,
    pub points_per_game: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShootingEfficiencyRow {
    pub player_name: String,
    pub team: String,
    pub season: i32,
    pub goals: u32,
    pub shots: u32,
    /// goals / shots, unscaled. Independent of the 0-100 shooting
    /// percentage in [`crate::metrics::DerivedMetrics`].
    pub shooting_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerGameConsistencyRow {
    pub player_name: String,
    pub team: String,
    pub season: i32,
    pub goals_per_game: f64,
    pub assists_per_game: f64,
    pub shots_per_game: f64,
    pub toi_per_game: f64,
}

/// One cell of the scouting heatmap: every record sharing a
/// (season, scouting_grade) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoutingHeatmapRow {
    pub season: i32,
    pub scouting_grade: i32,
    pub avg_points: f64,
    pub player_count: usize,
}

/// A complete dataset. Serializes as a bare array of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartDataset {
    GoalsAssists(Vec<GoalsAssistsRow>),
    Production(Vec<ProductionRow>),
    ShootingEfficiency(Vec<ShootingEfficiencyRow>),
    PerGameConsistency(Vec<PerGameConsistencyRow>),
    ScoutingHeatmap(Vec<ScoutingHeatmapRow>),
}

impl ChartDataset {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartDataset::GoalsAssists(_) => ChartKind::GoalsAssists,
            ChartDataset::Production(_) => ChartKind::Production,
            ChartDataset::ShootingEfficiency(_) => ChartKind::ShootingEfficiency,
            ChartDataset::PerGameConsistency(_) => ChartKind::PerGameConsistency,
            ChartDataset::ScoutingHeatmap(_) => ChartKind::ScoutingHeatmap,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChartDataset::GoalsAssists(rows) => rows.len(),
            ChartDataset::Production(rows) => rows.len(),
            ChartDataset::ShootingEfficiency(rows) => rows.len(),
            ChartDataset::PerGameConsistency(rows) => rows.len(),
            ChartDataset::ScoutingHeatmap(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Build the dataset for `kind`. The filter is ignored for the scouting
/// heatmap (see [`ChartKind::honors_filters`]).
pub fn build(kind: ChartKind, records: &[PlayerSeasonRecord], filter: &RecordFilter) -> ChartDataset {
    match kind {
        ChartKind::GoalsAssists => ChartDataset::GoalsAssists(goals_assists(records, filter)),
        ChartKind::Production => ChartDataset::Production(production(records, filter)),
        ChartKind::ShootingEfficiency => {
            ChartDataset::ShootingEfficiency(shooting_efficiency(records, filter))
        }
        ChartKind::PerGameConsistency => {
            ChartDataset::PerGameConsistency(per_game_consistency(records, filter))
        }
        ChartKind::ScoutingHeatmap => ChartDataset::ScoutingHeatmap(scouting_heatmap(records)),
    }
}

/// Sort `(key, row)` pairs by key, highest first, keeping input order for
/// equal keys, and drop the keys.
fn sorted_desc<T>(mut keyed: Vec<(f64, T)>) -> Vec<T> {
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    keyed.into_iter().map(|(_, row)| row).collect()
}

/// Raw goals, assists and points, highest points first.
pub fn goals_assists(records: &[PlayerSeasonRecord], filter: &RecordFilter) -> Vec<GoalsAssistsRow> {
    let mut rows: Vec<GoalsAssistsRow> = records
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| GoalsAssistsRow {
            player_name: r.player_name.clone(),
            team: r.team.clone(),
            season: r.season,
            goals: r.goals,
            assists: r.assists,
            points: r.points,
        })
        .collect();
    rows.sort_by(|a, b| b.points.cmp(&a.points));
    rows
}

/// Time on ice and points per game for records with games played, best
/// points-per-game first. Sorting uses the unrounded rate.
pub fn production(records: &[PlayerSeasonRecord], filter: &RecordFilter) -> Vec<ProductionRow> {
    let keyed = records
        .iter()
        .filter(|r| filter.matches(r) && r.games_played > 0)
        .map(|r| {
            let gp = u64::from(r.games_played);
            let raw_ppg = f64::from(r.points) / gp as f64;
            let row = ProductionRow {
                player_name: r.player_name.clone(),
                team: r.team.clone(),
                season: r.season,
                toi_per_game: per_game(u64::from(r.time_on_ice_seconds), gp),
                points_per_game: per_game(u64::from(r.points), gp),
            };
            (raw_ppg, row)
        })
        .collect();
    sorted_desc(keyed)
}

/// Goals per shot for records with at least one shot, most efficient
/// first. Sorting uses the unrounded ratio.
pub fn shooting_efficiency(
    records: &[PlayerSeasonRecord],
    filter: &RecordFilter,
) -> Vec<ShootingEfficiencyRow> {
    let keyed = records
        .iter()
        .filter(|r| filter.matches(r) && r.shots > 0)
        .map(|r| {
            let raw = f64::from(r.goals) / f64::from(r.shots);
            let row = ShootingEfficiencyRow {
                player_name: r.player_name.clone(),
                team: r.team.clone(),
                season: r.season,
                goals: r.goals,
                shots: r.shots,
                shooting_efficiency: ratio(f64::from(r.goals), f64::from(r.shots), 1.0, 2),
            };
            (raw, row)
        })
        .collect();
    sorted_desc(keyed)
}

/// Per-game rates for every matching record, in input order.
pub fn per_game_consistency(
    records: &[PlayerSeasonRecord],
    filter: &RecordFilter,
) -> Vec<PerGameConsistencyRow> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| {
            let gp = u64::from(r.games_played);
            PerGameConsistencyRow {
                player_name: r.player_name.clone(),
                team: r.team.clone(),
                season: r.season,
                goals_per_game: per_game(u64::from(r.goals), gp),
                assists_per_game: per_game(u64::from(r.assists), gp),
                shots_per_game: per_game(u64::from(r.shots), gp),
                toi_per_game: per_game(u64::from(r.time_on_ice_seconds), gp),
            }
        })
        .collect()
}

/// Average points per (season, scouting_grade) group, ordered by season
/// then grade.
pub fn scouting_heatmap(records: &[PlayerSeasonRecord]) -> Vec<ScoutingHeatmapRow> {
    let mut groups: BTreeMap<(i32, i32), (u64, usize)> = BTreeMap::new();
    for r in records {
        let entry = groups.entry((r.season, r.scouting_grade)).or_insert((0, 0));
        entry.0 += u64::from(r.points);
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((season, scouting_grade), (total_points, count))| ScoutingHeatmapRow {
            season,
            scouting_grade,
            avg_points: round_to(total_points as f64 / count as f64, 2),
            player_count: count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    fn rec(
        season: i32,
        name: &str,
        gp: u32,
        toi: u32,
        shots: u32,
        goals: u32,
        assists: u32,
        grade: i32,
    ) -> PlayerSeasonRecord {
        PlayerSeasonRecord {
            season,
            player_name: name.into(),
            team: "COL".into(),
            games_played: gp,
            time_on_ice_seconds: toi,
            shots,
            goals,
            assists,
            points: goals + assists,
            scouting_grade: grade,
        }
    }

    fn sample_records() -> Vec<PlayerSeasonRecord> {
        vec![
            rec(2022, "MacKinnon, Nathan", 71, 71 * 1320, 299, 32, 79, 9),
            rec(2023, "MacKinnon, Nathan", 82, 82 * 1360, 405, 51, 89, 10),
            rec(2022, "Makar, Cale", 60, 60 * 1560, 203, 17, 49, 9),
            rec(2023, "Makar, Cale", 77, 77 * 1530, 226, 21, 69, 9),
            rec(2023, "Rantanen, Mikko", 80, 80 * 1260, 282, 42, 62, 8),
            rec(2023, "Scratch, Healthy", 0, 0, 0, 0, 0, 3),
        ]
    }

    fn names<T>(rows: &[T], name: impl Fn(&T) -> &str) -> Vec<String> {
        rows.iter().map(|r| name(r).to_string()).collect()
    }

    // -- goals / assists / points --

    #[test]
    fn goals_assists_sorted_by_points_desc() {
        let rows = goals_assists(&sample_records(), &RecordFilter::all());
        assert_eq!(rows.len(), 6);
        let points: Vec<u32> = rows.iter().map(|r| r.points).collect();
        assert_eq!(points, vec![140, 111, 104, 90, 66, 0]);
        assert_eq!(rows[0].player_name, "MacKinnon, Nathan");
        assert_eq!(rows[0].season, 2023);
    }

    #[test]
    fn goals_assists_equal_points_keep_input_order() {
        let records = vec![
            rec(2023, "First, Tied", 10, 0, 10, 5, 5, 5),
            rec(2023, "Second, Tied", 10, 0, 10, 4, 6, 5),
        ];
        let rows = goals_assists(&records, &RecordFilter::all());
        assert_eq!(rows[0].player_name, "First, Tied");
        assert_eq!(rows[1].player_name, "Second, Tied");
    }

    // -- production --

    #[test]
    fn production_excludes_zero_games_and_sorts_by_rate() {
        let rows = production(&sample_records(), &RecordFilter::all());
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.player_name != "Scratch, Healthy"));

        // 140/82 = 1.71 beats 111/71 = 1.56
        assert_eq!(rows[0].player_name, "MacKinnon, Nathan");
        assert_eq!(rows[0].season, 2023);
        assert_eq!(rows[0].points_per_game, 1.71);
        assert_eq!(rows[0].toi_per_game, 1360.0);

        let ppg: Vec<f64> = rows.iter().map(|r| r.points_per_game).collect();
        assert!(ppg.windows(2).all(|w| w[0] >= w[1]));
    }

    // -- shooting efficiency --

    #[test]
    fn shooting_efficiency_is_unscaled_ratio() {
        let rows = shooting_efficiency(&sample_records(), &RecordFilter::season(2023));
        assert_eq!(rows.len(), 3);
        // 42/282 = 0.149 > 51/405 = 0.126 > 21/226 = 0.093
        assert_eq!(
            names(&rows, |r| r.player_name.as_str()),
            vec!["Rantanen, Mikko", "MacKinnon, Nathan", "Makar, Cale"]
        );
        assert_eq!(rows[0].shooting_efficiency, 0.15);
        assert_eq!(rows[1].shooting_efficiency, 0.13);
        assert_eq!(rows[2].shooting_efficiency, 0.09);
    }

    #[test]
    fn shooting_efficiency_sorts_on_unrounded_ratio() {
        // Both round to 0.13, but 0.1349 > 0.1251.
        let records = vec![
            rec(2023, "Lower, Shooter", 10, 0, 10_000, 1251, 0, 5),
            rec(2023, "Higher, Shooter", 10, 0, 10_000, 1349, 0, 5),
        ];
        let rows = shooting_efficiency(&records, &RecordFilter::all());
        assert_eq!(rows[0].player_name, "Higher, Shooter");
        assert_eq!(rows[0].shooting_efficiency, rows[1].shooting_efficiency);
    }

    // -- per-game consistency --

    #[test]
    fn per_game_consistency_keeps_input_order_and_zero_policy() {
        let rows = per_game_consistency(&sample_records(), &RecordFilter::season(2023));
        assert_eq!(
            names(&rows, |r| r.player_name.as_str()),
            vec![
                "MacKinnon, Nathan",
                "Makar, Cale",
                "Rantanen, Mikko",
                "Scratch, Healthy"
            ]
        );

        let scratch = &rows[3];
        assert_eq!(scratch.goals_per_game, 0.0);
        assert_eq!(scratch.assists_per_game, 0.0);
        assert_eq!(scratch.shots_per_game, 0.0);
        assert_eq!(scratch.toi_per_game, 0.0);

        assert_eq!(rows[0].goals_per_game, 0.62);
        assert_eq!(rows[0].assists_per_game, 1.09);
        assert_eq!(rows[0].shots_per_game, 4.94);
    }

    // -- filters --

    #[test]
    fn filters_compose_conjunctively_for_every_filtered_chart() {
        let records = sample_records();
        let filter = RecordFilter::season(2023).with_players(["Makar, Cale"]);

        for kind in ChartKind::ALL.into_iter().filter(ChartKind::honors_filters) {
            let all = build(kind, &records, &RecordFilter::all());
            let filtered = build(kind, &records, &filter);
            assert_eq!(filtered.len(), 1, "{kind} should keep exactly one row");
            assert!(filtered.len() <= all.len());

            let json = serde_json::to_value(&filtered).unwrap();
            assert_eq!(json[0]["player_name"], "Makar, Cale", "{kind}");
            assert_eq!(json[0]["season"], 2023, "{kind}");
        }
    }

    #[test]
    fn player_filter_without_season() {
        let filter = RecordFilter::all().with_players(["Makar, Cale", "Rantanen, Mikko"]);
        let rows = goals_assists(&sample_records(), &filter);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.player_name != "MacKinnon, Nathan"));
    }

    // -- scouting heatmap --

    #[test]
    fn heatmap_groups_by_season_and_grade() {
        let rows = scouting_heatmap(&sample_records());

        let keys: Vec<(i32, i32)> = rows.iter().map(|r| (r.season, r.scouting_grade)).collect();
        assert_eq!(keys, vec![(2022, 9), (2023, 3), (2023, 8), (2023, 9), (2023, 10)]);

        // MacKinnon 2022 (111) and Makar 2022 (66) share (2022, 9).
        assert_eq!(rows[0].player_count, 2);
        assert_eq!(rows[0].avg_points, 88.5);
        // Makar 2023 is alone at (2023, 9).
        assert_eq!(rows[3].player_count, 1);
        assert_eq!(rows[3].avg_points, 90.0);
    }

    #[test]
    fn heatmap_average_rounds_to_two_places() {
        let records = vec![
            rec(2024, "A, A", 1, 0, 1, 1, 0, 5),
            rec(2024, "B, B", 1, 0, 1, 1, 0, 5),
            rec(2024, "C, C", 1, 0, 1, 0, 0, 5),
        ];
        let rows = scouting_heatmap(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].avg_points, 0.67);
    }

    #[test]
    fn heatmap_ignores_filters() {
        let records = sample_records();
        let filtered = build(ChartKind::ScoutingHeatmap, &records, &RecordFilter::season(2022));
        assert_eq!(filtered.len(), 5);
    }

    // -- kinds --

    #[test]
    fn chart_kind_parses_route_names() {
        assert_eq!("total-points".parse::<ChartKind>().unwrap(), ChartKind::GoalsAssists);
        assert_eq!("goals_assists".parse::<ChartKind>().unwrap(), ChartKind::GoalsAssists);
        assert_eq!(
            "Per-Game-Consistency".parse::<ChartKind>().unwrap(),
            ChartKind::PerGameConsistency
        );
        assert!("pie".parse::<ChartKind>().is_err());

        let kind: ChartKind = serde_json::from_str("\"scouting-heatmap\"").unwrap();
        assert_eq!(kind, ChartKind::ScoutingHeatmap);
        assert_eq!(serde_json::to_string(&ChartKind::Production).unwrap(), "\"production\"");
    }

    #[test]
    fn empty_input_gives_empty_datasets() {
        for kind in ChartKind::ALL {
            assert!(build(kind, &[], &RecordFilter::all()).is_empty());
        }
    }
}
