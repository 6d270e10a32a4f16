use crate::data::{Bar, PriceSeries};
use crate::engine::position::{ExitKind, Position};
use crate::instrument::ContractSpec;

//applies the entry policies for one side of one combination and resolves
//accepted entries against the fill series
//longs fill against the bid series, shorts against the ask series
pub struct PositionTracker<'a> {
    fill_series: &'a PriceSeries,
    contract: &'a ContractSpec,
    lots: u32,
    max_lots: u32,
    allow_overlap: bool,
    target: f64,
    stop: f64,
}

impl<'a> PositionTracker<'a> {
    pub fn new(
        fill_series: &'a PriceSeries,
        contract: &'a ContractSpec,
        lots: u32,
        max_lots: u32,
        allow_overlap: bool,
        target: f64,
        stop: f64,
    ) -> Self {
        PositionTracker {
            fill_series,
            contract,
            lots,
            max_lots,
            allow_overlap,
            target,
            stop,
        }
    }

    //attempts a long entry at the given signal bar
    //does not mutate existing; the caller appends the returned position
    pub fn try_open_long(&self, existing: &[Position], entry_bar: &Bar) -> Position {
        let entry_time = entry_bar.timestamp;
        let mut current_lots: i64 = 0;

        if !self.allow_overlap {
            //no pyramiding: reject while any recorded exit lies ahead of the
            //candidate entry
            //only positions with a recorded exit are inspected here; a
            //position still open never triggers this rejection (see DESIGN.md)
            for trade in existing {
                if let Some(exit_time) = trade.exit_time {
                    if entry_time < exit_time {
                        return Position::rejected(entry_time, ExitKind::Overlap, 0);
                    }
                }
            }
        } else {
            //pyramiding: count sibling trades open around the candidate entry
            for trade in existing {
                if let Some(exit_time) = trade.exit_time {
                    if entry_time < exit_time && entry_time > trade.entry_time {
                        current_lots += 1;
                    }
                }
            }
        }

        let open_lots = current_lots * self.lots as i64;
        if open_lots >= self.max_lots as i64 {
            return Position::rejected(entry_time, ExitKind::LotLimit, open_lots);
        }

        let entry_price = entry_bar.close;
        let target_price = entry_price + self.target;
        let stop_price = entry_price - self.stop;

        //scan the fill series forward from strictly after the entry
        for bar in &self.fill_series.bars {
            if bar.timestamp <= entry_time {
                continue;
            }
            let current_price = bar.open;
            if current_price >= target_price {
                let pnl = self
                    .contract
                    .pnl_from_price_move(current_price - entry_price, self.lots);
                return Position::resolved(
                    entry_time,
                    bar.timestamp,
                    entry_price,
                    target_price,
                    stop_price,
                    ExitKind::Win,
                    pnl,
                    open_lots,
                );
            }
            if current_price <= stop_price {
                let pnl = self
                    .contract
                    .pnl_from_price_move(current_price - entry_price, self.lots);
                return Position::resolved(
                    entry_time,
                    bar.timestamp,
                    entry_price,
                    target_price,
                    stop_price,
                    ExitKind::Loss,
                    pnl,
                    open_lots,
                );
            }
        }

        Position::left_open(entry_time, entry_price, target_price, stop_price, open_lots)
    }

    //attempts a short entry: target below and stop above the entry price,
    //pnl sign inverted, open lot counts stored negative
    pub fn try_open_short(&self, existing: &[Position], entry_bar: &Bar) -> Position {
        let entry_time = entry_bar.timestamp;
        let mut current_lots: i64 = 0;

        if !self.allow_overlap {
            for trade in existing {
                if let Some(exit_time) = trade.exit_time {
                    if entry_time < exit_time {
                        return Position::rejected(entry_time, ExitKind::Overlap, 0);
                    }
                }
            }
        } else {
            for trade in existing {
                if let Some(exit_time) = trade.exit_time {
                    if entry_time < exit_time && entry_time > trade.entry_time {
                        current_lots += 1;
                    }
                }
            }
        }

        if current_lots * self.lots as i64 >= self.max_lots as i64 {
            return Position::rejected(
                entry_time,
                ExitKind::LotLimit,
                -(current_lots * self.lots as i64),
            );
        }
        let open_lots = -(current_lots * self.lots as i64);

        let entry_price = entry_bar.close;
        let target_price = entry_price - self.target;
        let stop_price = entry_price + self.stop;

        for bar in &self.fill_series.bars {
            if bar.timestamp <= entry_time {
                continue;
            }
            let current_price = bar.open;
            if current_price <= target_price {
                let pnl = self
                    .contract
                    .pnl_from_price_move(entry_price - current_price, self.lots);
                return Position::resolved(
                    entry_time,
                    bar.timestamp,
                    entry_price,
                    target_price,
                    stop_price,
                    ExitKind::Win,
                    pnl,
                    open_lots,
                );
            }
            if current_price >= stop_price {
                let pnl = self
                    .contract
                    .pnl_from_price_move(entry_price - current_price, self.lots);
                return Position::resolved(
                    entry_time,
                    bar.timestamp,
                    entry_price,
                    target_price,
                    stop_price,
                    ExitKind::Loss,
                    pnl,
                    open_lots,
                );
            }
        }

        Position::left_open(entry_time, entry_price, target_price, stop_price, open_lots)
    }
}
