pub mod summary;

pub use summary::{score, MetricError, PruneReason, ScoreConfig, ScoreOutcome, SummaryRecord};
