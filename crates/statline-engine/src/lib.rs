// Aggregation and comparison engine: derived metrics, chart datasets and
// head-to-head verdicts over season stat records.

pub mod charts;
pub mod compare;
pub mod error;
pub mod metrics;
pub mod service;
pub mod teams;

pub use charts::{ChartDataset, ChartKind};
pub use compare::{ComparisonResult, Criterion, HeadToHeadSummary, Verdict};
pub use error::StatsError;
pub use metrics::{DerivedMetrics, StatLine};
pub use service::StatsService;
