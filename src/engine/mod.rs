pub mod position;
pub mod simulator;
pub mod sweep;
pub mod tracker;

pub use position::{ExitKind, Position};
pub use simulator::TradeSimulator;
pub use sweep::{
    ema_pair_allowed, stop_allowed, GridWalker, ParamSet, SweepEngine, SweepError, SweepOutcome,
};
pub use tracker::PositionTracker;
