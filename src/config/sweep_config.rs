use crate::instrument::ContractSpec;
use crate::metrics::ScoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

//scoring and pruning mode
//Base keeps loosely losing combinations above a pnl floor; Strict demands
//profitability and tightens the grid constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreMode {
    Base,
    Strict,
}

impl ScoreMode {
    //parse mode from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "base" => Some(ScoreMode::Base),
            "strict" => Some(ScoreMode::Strict),
            _ => None,
        }
    }
}

//the swept dimensions, in nesting order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamGrid {
    pub overlaps: Vec<bool>,
    pub rsi_windows: Vec<usize>,
    pub rsi_upper_bounds: Vec<f64>,
    pub rsi_lower_bounds: Vec<f64>,
    //feeds both the slow and the fast level
    pub ema_periods: Vec<usize>,
    pub targets: Vec<f64>,
    pub stops: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        ParamGrid {
            overlaps: vec![true],
            rsi_windows: (7..36).step_by(7).collect(),
            rsi_upper_bounds: (50..85).step_by(5).map(|v| v as f64).collect(),
            rsi_lower_bounds: (15..50).step_by(5).map(|v| v as f64).collect(),
            ema_periods: (7..43).step_by(7).collect(),
            targets: (800..1700).step_by(200).map(|v| v as f64).collect(),
            stops: vec![800.0, 1000.0],
        }
    }
}

//complete sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepConfiguration {
    pub grid: ParamGrid,

    //lots entered per signal
    pub lots: u32,

    //maximum lots open on one side at any time
    pub max_lots: u32,

    pub mode: ScoreMode,

    //base mode drops combinations whose combined net pnl falls below this
    pub pnl_floor: f64,

    //strict mode demands at least this combined profitability
    pub min_profitability: f64,

    //skip a combination with undefined arithmetic instead of halting
    pub skip_undefined: bool,

    pub contract: ContractSpec,
}

impl Default for SweepConfiguration {
    fn default() -> Self {
        SweepConfiguration {
            grid: ParamGrid::default(),
            lots: 1,
            max_lots: 10,
            mode: ScoreMode::Base,
            pnl_floor: -6000.0,
            min_profitability: 0.30,
            skip_undefined: false,
            contract: ContractSpec::crude(),
        }
    }
}

impl SweepConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SweepConfiguration = serde_json::from_str(&contents)?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //the slice of this configuration the aggregator needs
    pub fn score_config(&self) -> ScoreConfig {
        ScoreConfig {
            mode: self.mode,
            pnl_floor: self.pnl_floor,
            min_profitability: self.min_profitability,
            lots: self.lots,
        }
    }
}
