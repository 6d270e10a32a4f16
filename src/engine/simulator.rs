use crate::data::PriceSeries;
use crate::engine::position::Position;
use crate::engine::sweep::ParamSet;
use crate::engine::tracker::PositionTracker;
use crate::instrument::ContractSpec;

//drives the trackers across one annotated signal series for one parameter
//combination; stateless across calls
pub struct TradeSimulator<'a> {
    //ask side: generates signals and fills short exits
    signal_series: &'a PriceSeries,
    //bid side: fills long exits
    long_fill_series: &'a PriceSeries,
    contract: &'a ContractSpec,
    lots: u32,
    max_lots: u32,
}

impl<'a> TradeSimulator<'a> {
    pub fn new(
        signal_series: &'a PriceSeries,
        long_fill_series: &'a PriceSeries,
        contract: &'a ContractSpec,
        lots: u32,
        max_lots: u32,
    ) -> Self {
        TradeSimulator {
            signal_series,
            long_fill_series,
            contract,
            lots,
            max_lots,
        }
    }

    //runs one full pass and returns the long and short position lists
    pub fn simulate(&self, params: &ParamSet) -> (Vec<Position>, Vec<Position>) {
        let long_tracker = PositionTracker::new(
            self.long_fill_series,
            self.contract,
            self.lots,
            self.max_lots,
            params.overlap,
            params.target,
            params.stop,
        );
        let short_tracker = PositionTracker::new(
            self.signal_series,
            self.contract,
            self.lots,
            self.max_lots,
            params.overlap,
            params.target,
            params.stop,
        );

        let mut longs = Vec::new();
        let mut shorts = Vec::new();

        for bar in &self.signal_series.bars {
            //warm-up bars have no indicator values and generate no signal
            let Some((rsi, ma_fast, ma_slow)) = bar.indicator_values() else {
                continue;
            };

            //both conditions are evaluated independently on every bar
            if ma_fast > ma_slow && rsi < params.rsi_lower {
                longs.push(long_tracker.try_open_long(&longs, bar));
            }
            if ma_fast < ma_slow && rsi > params.rsi_upper {
                shorts.push(short_tracker.try_open_short(&shorts, bar));
            }
        }

        (longs, shorts)
    }
}
