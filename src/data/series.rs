use crate::data::bar::Bar;
use crate::indicators::{ema, rsi};
use serde::{Deserialize, Serialize};

//an ordered, time-indexed sequence of bars for one side of the market
//two series exist per sweep: the ask side generates signals and fills short
//exits, the bid side fills long exits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub name: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(name: String, bars: Vec<Bar>) -> Self {
        PriceSeries { name, bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    //returns the close column
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    //returns a fresh snapshot with indicator columns computed for the given
    //parameters; the receiver is never annotated in place, so snapshots for
    //different combinations can coexist and be evaluated in parallel
    pub fn with_indicators(
        &self,
        rsi_window: usize,
        fast_period: usize,
        slow_period: usize,
    ) -> PriceSeries {
        let closes = self.closes();
        let rsi_col = rsi(&closes, rsi_window);
        let fast_col = ema(&closes, fast_period);
        let slow_col = ema(&closes, slow_period);

        let bars = self
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let mut annotated = bar.clone();
                annotated.rsi = rsi_col[i];
                annotated.ma_fast = fast_col[i];
                annotated.ma_slow = slow_col[i];
                annotated
            })
            .collect();

        PriceSeries::new(self.name.clone(), bars)
    }
}
