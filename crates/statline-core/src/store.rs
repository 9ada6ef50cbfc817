// Read-side interface the stats engine consumes.

use anyhow::Result;

use crate::record::{PlayerSeasonRecord, RecordFilter};

/// Source of season records.
///
/// Implementations decide how records are persisted; callers only rely on
/// filtered retrieval and the distinct-name listing. Returned order is not
/// part of the contract.
pub trait RecordStore {
    /// Fetch every record that passes `filter`.
    fn fetch(&self, filter: &RecordFilter) -> Result<Vec<PlayerSeasonRecord>>;

    /// Distinct player names across all records.
    fn fetch_distinct_names(&self) -> Result<Vec<String>>;
}

/// In-memory store over an owned record list. Handy for tests and for
/// embedding the engine without a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<PlayerSeasonRecord>,
}

impl MemoryStore {
    pub fn new(records: Vec<PlayerSeasonRecord>) -> Self {
        Self { records }
    }
}

impl RecordStore for MemoryStore {
    fn fetch(&self, filter: &RecordFilter) -> Result<Vec<PlayerSeasonRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn fetch_distinct_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.records {
            if !names.contains(&record.player_name) {
                names.push(record.player_name.clone());
            }
        }
        Ok(names)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn fetch(&self, filter: &RecordFilter) -> Result<Vec<PlayerSeasonRecord>> {
        (**self).fetch(filter)
    }

    fn fetch_distinct_names(&self) -> Result<Vec<String>> {
        (**self).fetch_distinct_names()
    }
}
