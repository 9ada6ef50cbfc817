// Typed failures surfaced by the stats engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    /// The caller passed an argument the operation cannot accept, such as a
    /// comparison request that does not name exactly two players.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No records matched a requested player/season combination.
    #[error("not found: {0}")]
    NotFound(String),

    /// The record store failed to answer.
    #[error("record store failure: {0:#}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for StatsError {
    fn from(err: anyhow::Error) -> Self {
        StatsError::Store(err)
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
