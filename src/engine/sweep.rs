use crate::config::{ParamGrid, ScoreMode, SweepConfiguration};
use crate::data::PriceSeries;
use crate::engine::position::Position;
use crate::engine::simulator::TradeSimulator;
use crate::metrics::{score, MetricError, ScoreConfig, ScoreOutcome, SummaryRecord};
use indexmap::IndexMap;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

//dimension levels in nesting order, outermost first
pub const LVL_OVERLAP: usize = 0;
pub const LVL_RSI_WINDOW: usize = 1;
pub const LVL_RSI_UPPER: usize = 2;
pub const LVL_RSI_LOWER: usize = 3;
pub const LVL_EMA_SLOW: usize = 4;
pub const LVL_EMA_FAST: usize = 5;
pub const LVL_TARGET: usize = 6;
pub const LVL_STOP: usize = 7;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error(transparent)]
    Metric(#[from] MetricError),
}

//one point in the parameter grid
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSet {
    pub overlap: bool,
    pub rsi_window: usize,
    pub rsi_upper: f64,
    pub rsi_lower: f64,
    pub ema_slow: usize,
    pub ema_fast: usize,
    pub target: f64,
    pub stop: f64,
}

impl ParamSet {
    //builds the parameter set addressed by an index vector over all eight
    //dimension levels
    pub fn from_grid(grid: &ParamGrid, idx: &[usize]) -> Self {
        ParamSet {
            overlap: grid.overlaps[idx[LVL_OVERLAP]],
            rsi_window: grid.rsi_windows[idx[LVL_RSI_WINDOW]],
            rsi_upper: grid.rsi_upper_bounds[idx[LVL_RSI_UPPER]],
            rsi_lower: grid.rsi_lower_bounds[idx[LVL_RSI_LOWER]],
            ema_slow: grid.ema_periods[idx[LVL_EMA_SLOW]],
            ema_fast: grid.ema_periods[idx[LVL_EMA_FAST]],
            target: grid.targets[idx[LVL_TARGET]],
            stop: grid.stops[idx[LVL_STOP]],
        }
    }

    //the unique settings label joining a summary row to its trade dump
    pub fn label(&self) -> String {
        format!(
            "overlap_{}-rsiwindow_{}-rsiupper_{}-rsilower_{}-slowema_{}-fastema_{}-target_{}-stop_{}",
            self.overlap,
            self.rsi_window,
            self.rsi_upper,
            self.rsi_lower,
            self.ema_slow,
            self.ema_fast,
            self.target,
            self.stop
        )
    }
}

//iterative cartesian enumerator over the grid dimensions
//advance() steps to the next combination; break_out(level) stops iterating
//the given level and resumes at the next value of the enclosing one, which
//is how the sweep's order-sensitive pruning is expressed
#[derive(Debug, Clone)]
pub struct GridWalker {
    lens: Vec<usize>,
    idx: Vec<usize>,
    done: bool,
}

impl GridWalker {
    pub fn new(lens: &[usize]) -> Self {
        let done = lens.is_empty() || lens.iter().any(|&len| len == 0);
        GridWalker {
            lens: lens.to_vec(),
            idx: vec![0; lens.len()],
            done,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn current(&self) -> &[usize] {
        &self.idx
    }

    //increments the index at pos, resetting deeper levels and carrying
    //outward; returns false once the grid is exhausted
    fn bump(&mut self, mut pos: usize) -> bool {
        if self.done {
            return false;
        }
        for slot in self.idx[pos + 1..].iter_mut() {
            *slot = 0;
        }
        loop {
            self.idx[pos] += 1;
            if self.idx[pos] < self.lens[pos] {
                return true;
            }
            self.idx[pos] = 0;
            if pos == 0 {
                self.done = true;
                return false;
            }
            pos -= 1;
        }
    }

    //steps to the next combination in nesting order
    pub fn advance(&mut self) -> bool {
        if self.done {
            return false;
        }
        self.bump(self.lens.len() - 1)
    }

    //stops iterating the given level: skips every remaining value at that
    //level and below and resumes at the next value of the enclosing level
    pub fn break_out(&mut self, level: usize) -> bool {
        if level == 0 {
            self.done = true;
            return false;
        }
        self.bump(level - 1)
    }
}

//the slow/fast pair constraint checked at the fast level
//failure breaks the fast loop, not just the current value
pub fn ema_pair_allowed(mode: ScoreMode, slow: usize, fast: usize) -> bool {
    match mode {
        ScoreMode::Base => slow > fast,
        ScoreMode::Strict => slow > fast && slow >= 28 && fast <= 15,
    }
}

//the stop/target constraint checked at the stop level
pub fn stop_allowed(mode: ScoreMode, target: f64, stop: f64) -> bool {
    match mode {
        ScoreMode::Base => stop <= target,
        ScoreMode::Strict => stop < target,
    }
}

//everything a full sweep produces: summary records in enumeration order and
//the raw trade dump of every combination that reached simulation
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub records: Vec<SummaryRecord>,
    pub dumps: IndexMap<String, Vec<Position>>,
}

//output of one cell (all stop values for one setting of the outer levels)
#[derive(Debug, Default)]
struct CellOutput {
    records: Vec<SummaryRecord>,
    dumps: Vec<(String, Vec<Position>)>,
}

//one-slot cache of the annotated signal snapshot, keyed by the indicator
//parameter triple; consecutive cells usually share it
#[derive(Default)]
struct SnapshotCache {
    slot: Option<((usize, usize, usize), PriceSeries)>,
}

impl SnapshotCache {
    fn annotate(
        &mut self,
        series: &PriceSeries,
        rsi_window: usize,
        fast: usize,
        slow: usize,
    ) -> &PriceSeries {
        let key = (rsi_window, fast, slow);
        let stale = !matches!(&self.slot, Some((cached, _)) if *cached == key);
        if stale {
            self.slot = Some((key, series.with_indicators(rsi_window, fast, slow)));
        }
        //filled just above
        &self.slot.as_ref().unwrap().1
    }
}

//enumerates the parameter grid, runs the simulator and the aggregator per
//combination, and collects surviving records plus per-combination dumps
pub struct SweepEngine<'a> {
    signal_series: &'a PriceSeries,
    long_fill_series: &'a PriceSeries,
    config: &'a SweepConfiguration,
}

impl<'a> SweepEngine<'a> {
    pub fn new(
        signal_series: &'a PriceSeries,
        long_fill_series: &'a PriceSeries,
        config: &'a SweepConfiguration,
    ) -> Self {
        SweepEngine {
            signal_series,
            long_fill_series,
            config,
        }
    }

    //enumerates cells (all levels above the stop one), applying the
    //slow/fast break rule at the fast level
    fn enumerate_cells(&self) -> Vec<Vec<usize>> {
        let grid = &self.config.grid;
        let lens = [
            grid.overlaps.len(),
            grid.rsi_windows.len(),
            grid.rsi_upper_bounds.len(),
            grid.rsi_lower_bounds.len(),
            grid.ema_periods.len(),
            grid.ema_periods.len(),
            grid.targets.len(),
        ];

        let mut walker = GridWalker::new(&lens);
        let mut cells = Vec::new();

        while !walker.is_done() {
            let idx = walker.current();
            let slow = grid.ema_periods[idx[LVL_EMA_SLOW]];
            let fast = grid.ema_periods[idx[LVL_EMA_FAST]];

            if !ema_pair_allowed(self.config.mode, slow, fast) {
                walker.break_out(LVL_EMA_FAST);
                continue;
            }

            cells.push(idx.to_vec());
            walker.advance();
        }

        cells
    }

    //runs the stop loop of one cell against an annotated snapshot
    //score pruning ends the loop early; a drop or an undefined-metric skip
    //moves on to the next stop value
    fn run_cell(
        &self,
        annotated: &PriceSeries,
        cell: &[usize],
        score_config: &ScoreConfig,
    ) -> Result<CellOutput, SweepError> {
        let grid = &self.config.grid;
        let mut output = CellOutput::default();
        let mut idx = cell.to_vec();
        idx.push(0);

        for stop_idx in 0..grid.stops.len() {
            idx[LVL_STOP] = stop_idx;
            let params = ParamSet::from_grid(grid, &idx);

            if !stop_allowed(self.config.mode, params.target, params.stop) {
                break;
            }

            let label = params.label();
            let simulator = TradeSimulator::new(
                annotated,
                self.long_fill_series,
                &self.config.contract,
                self.config.lots,
                self.config.max_lots,
            );
            let (longs, shorts) = simulator.simulate(&params);

            //the dump keeps every entry, including suppressed ones, for every
            //combination that reached simulation
            let mut trades = longs.clone();
            trades.extend(shorts.iter().cloned());
            output.dumps.push((label.clone(), trades));

            match score(
                &label,
                &longs,
                &shorts,
                &self.config.contract,
                score_config,
            ) {
                Ok(ScoreOutcome::Record(record)) => output.records.push(record),
                Ok(ScoreOutcome::Dropped) => {}
                Ok(ScoreOutcome::Pruned(reason)) => {
                    debug!(settings = %label, ?reason, "combination pruned");
                    break;
                }
                Err(err) if self.config.skip_undefined => {
                    warn!(settings = %label, %err, "skipping combination with undefined metric");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(output)
    }

    //sequential sweep in strict enumeration order
    pub fn run(&self) -> Result<SweepOutcome, SweepError> {
        let cells = self.enumerate_cells();
        info!(cells = cells.len(), "starting sweep");

        let score_config = self.config.score_config();
        let mut cache = SnapshotCache::default();
        let mut outcome = SweepOutcome::default();

        for (done, cell) in cells.iter().enumerate() {
            let grid = &self.config.grid;
            let annotated = cache.annotate(
                self.signal_series,
                grid.rsi_windows[cell[LVL_RSI_WINDOW]],
                grid.ema_periods[cell[LVL_EMA_FAST]],
                grid.ema_periods[cell[LVL_EMA_SLOW]],
            );

            let cell_output = self.run_cell(annotated, cell, &score_config)?;
            outcome.records.extend(cell_output.records);
            for (label, trades) in cell_output.dumps {
                outcome.dumps.insert(label, trades);
            }

            if (done + 1) % 100 == 0 {
                info!(
                    done = done + 1,
                    records = outcome.records.len(),
                    "sweep progress"
                );
            }
        }

        info!(records = outcome.records.len(), "sweep finished");
        Ok(outcome)
    }

    //parallel sweep over independent cells; runtime pruning only spans the
    //stop level, so this yields exactly the sequential output
    pub fn run_parallel(&self) -> Result<SweepOutcome, SweepError> {
        let cells = self.enumerate_cells();
        info!(cells = cells.len(), "starting parallel sweep");

        let score_config = self.config.score_config();
        let grid = &self.config.grid;

        let outputs: Result<Vec<CellOutput>, SweepError> = cells
            .par_iter()
            .map(|cell| {
                //each worker annotates into its own private snapshot
                let annotated = self.signal_series.with_indicators(
                    grid.rsi_windows[cell[LVL_RSI_WINDOW]],
                    grid.ema_periods[cell[LVL_EMA_FAST]],
                    grid.ema_periods[cell[LVL_EMA_SLOW]],
                );
                self.run_cell(&annotated, cell, &score_config)
            })
            .collect();

        let mut outcome = SweepOutcome::default();
        for cell_output in outputs? {
            outcome.records.extend(cell_output.records);
            for (label, trades) in cell_output.dumps {
                outcome.dumps.insert(label, trades);
            }
        }

        info!(records = outcome.records.len(), "sweep finished");
        Ok(outcome)
    }
}
