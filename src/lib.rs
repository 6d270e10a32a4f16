//a Rust-based parameter-sweep backtesting engine for two-sided futures strategies

pub mod config;
pub mod data;
pub mod engine;
pub mod indicators;
pub mod instrument;
pub mod metrics;
pub mod output;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ParamGrid, ScoreMode, SweepConfiguration};
    pub use crate::data::{load_csv, Bar, BarError, DataError, PriceSeries};
    pub use crate::engine::{
        ExitKind, GridWalker, ParamSet, Position, PositionTracker, SweepEngine, SweepError,
        SweepOutcome, TradeSimulator,
    };
    pub use crate::instrument::ContractSpec;
    pub use crate::metrics::{
        score, MetricError, PruneReason, ScoreConfig, ScoreOutcome, SummaryRecord,
    };
    pub use crate::output::{write_results, write_trade_dumps};
}
