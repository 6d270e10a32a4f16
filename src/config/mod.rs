pub mod sweep_config;

pub use sweep_config::{ParamGrid, ScoreMode, SweepConfiguration};
