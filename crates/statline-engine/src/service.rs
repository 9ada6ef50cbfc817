// Engine operations over an injected record store.
//
// Each call fetches from the store and hands the records to the pure chart,
// metric and comparison functions. Nothing is cached between calls.

use statline_core::{PlayerSeasonRecord, RecordFilter, RecordStore};
use tracing::debug;

use crate::charts::{self, ChartDataset, ChartKind};
use crate::compare::{self, ComparisonResult};
use crate::error::Result;
use crate::metrics::StatLine;

/// Player name ascending, then most recent season first.
fn sort_for_listing(records: &mut [PlayerSeasonRecord]) {
    records.sort_by(|a, b| {
        a.player_name
            .cmp(&b.player_name)
            .then_with(|| b.season.cmp(&a.season))
    });
}

pub struct StatsService<S> {
    store: S,
}

impl<S: RecordStore> StatsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build one chart dataset. The scouting heatmap is computed over every
    /// record regardless of `filter`.
    pub fn list_chart(&self, kind: ChartKind, filter: &RecordFilter) -> Result<ChartDataset> {
        let fetch_filter = if kind.honors_filters() {
            filter.clone()
        } else {
            RecordFilter::all()
        };
        let records = self.store.fetch(&fetch_filter)?;
        let dataset = charts::build(kind, &records, &fetch_filter);
        debug!(
            "Built {} chart: {} rows from {} records",
            kind,
            dataset.len(),
            records.len()
        );
        Ok(dataset)
    }

    /// Head-to-head comparison of exactly two players, optionally within a
    /// single season.
    pub fn compare(&self, players: &[String], season: Option<i32>) -> Result<ComparisonResult> {
        let (player1, player2) = compare::validate_pair(players)?;
        let filter = RecordFilter::all()
            .with_season(season)
            .with_players([player1, player2]);
        let records = self.store.fetch(&filter)?;
        compare::head_to_head(player1, player2, season, &records)
    }

    /// Every record, sorted by player name then season (newest first).
    pub fn list_all_records(&self) -> Result<Vec<PlayerSeasonRecord>> {
        let mut records = self.store.fetch(&RecordFilter::all())?;
        sort_for_listing(&mut records);
        Ok(records)
    }

    /// [`Self::list_all_records`] with derived metrics attached.
    pub fn list_stat_lines(&self) -> Result<Vec<StatLine>> {
        Ok(self
            .list_all_records()?
            .into_iter()
            .map(StatLine::from_record)
            .collect())
    }

    /// One player's seasons (newest first) with derived metrics. Unknown
    /// names give an empty list.
    pub fn player_stat_lines(&self, player_name: &str) -> Result<Vec<StatLine>> {
        let filter = RecordFilter::all().with_players([player_name]);
        let mut records = self.store.fetch(&filter)?;
        sort_for_listing(&mut records);
        Ok(records.into_iter().map(StatLine::from_record).collect())
    }

    /// Distinct player names, ascending.
    pub fn list_distinct_player_names(&self) -> Result<Vec<String>> {
        let mut names = self.store.fetch_distinct_names()?;
        names.sort();
        names.dedup();
        Ok(names)
    }
}
