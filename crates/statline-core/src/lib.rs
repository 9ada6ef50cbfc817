// Record model, record store interface, SQLite store and CSV bootstrap.

pub mod db;
pub mod loader;
pub mod record;
pub mod store;

pub use record::{PlayerSeasonRecord, RecordFilter};
pub use store::{MemoryStore, RecordStore};
