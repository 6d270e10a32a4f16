use crate::config::ScoreMode;
use crate::engine::position::{ExitKind, Position};
use crate::instrument::ContractSpec;
use chrono::Duration;
use statrs::statistics::Statistics;
use thiserror::Error;

//undefined arithmetic while scoring a combination; fatal by default
#[derive(Error, Debug)]
pub enum MetricError {
    #[error("Undefined {metric} for combination {settings}")]
    Undefined {
        settings: String,
        metric: &'static str,
    },
}

//why a combination was rejected before producing a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneReason {
    //one side produced no entries at all
    EmptySide,
    //one side produced entries but none resolved to a win or loss
    NoResolvedTrades,
    //combined net pnl fell below the configured floor
    PnlFloor,
    //strict mode: unprofitable or profitability below the floor
    Profitability,
}

//result of scoring one combination
//Pruned ends the current stop loop early; Dropped just skips the record
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Record(SummaryRecord),
    Pruned(PruneReason),
    Dropped,
}

//scoring thresholds and mode
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    pub mode: ScoreMode,
    pub pnl_floor: f64,
    pub min_profitability: f64,
    pub lots: u32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        ScoreConfig {
            mode: ScoreMode::Base,
            pnl_floor: -6000.0,
            min_profitability: 0.30,
            lots: 1,
        }
    }
}

//aggregated metrics for one parameter combination
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub settings: String,
    pub net_long_pnl: f64,
    pub net_short_pnl: f64,
    pub net_pnl: f64,
    pub profitability_longs: f64,
    pub profitability_shorts: f64,
    pub profitability_total: f64,
    pub num_trades: usize,
    pub num_longs: usize,
    pub num_shorts: usize,
    pub max_profit: f64,
    pub max_drawdown: f64,
    pub average_pnl: f64,
    pub risk_ratio: f64,
    pub average_trade_time: Duration,
    pub long_max_concurrent: i64,
    pub short_max_concurrent: i64,
}

//accumulates raw pnl and turnover for one side
//positions missing pnl or entry price are skipped: rejected entries carry
//neither and contribute nothing (best-effort accounting, intentional)
fn side_totals(positions: &[Position], lots: u32) -> (f64, f64) {
    let mut pnl_sum = 0.0;
    let mut turnover = 0.0;

    for position in positions {
        if let (Some(pnl), Some(entry_price)) = (position.pnl, position.entry_price) {
            pnl_sum += pnl;
            turnover += entry_price * lots as f64;
        }
    }

    (pnl_sum, turnover)
}

fn count_kind(positions: &[Position], kind: ExitKind) -> usize {
    positions.iter().filter(|p| p.exit_kind == kind).count()
}

//reduces the two position lists of one combination into a summary record,
//a prune verdict, or a drop
pub fn score(
    settings: &str,
    longs: &[Position],
    shorts: &[Position],
    contract: &ContractSpec,
    config: &ScoreConfig,
) -> Result<ScoreOutcome, MetricError> {
    if longs.is_empty() || shorts.is_empty() {
        return Ok(ScoreOutcome::Pruned(PruneReason::EmptySide));
    }

    let num_longs = longs.iter().filter(|p| p.is_resolved()).count();
    let num_shorts = shorts.iter().filter(|p| p.is_resolved()).count();
    if num_longs == 0 || num_shorts == 0 {
        return Ok(ScoreOutcome::Pruned(PruneReason::NoResolvedTrades));
    }

    //net pnl per side after brokerage on turnover
    let (long_pnl, long_turnover) = side_totals(longs, config.lots);
    let (short_pnl, short_turnover) = side_totals(shorts, config.lots);
    let net_long_pnl = long_pnl - contract.brokerage(long_turnover);
    let net_short_pnl = short_pnl - contract.brokerage(short_turnover);
    let net_pnl = net_long_pnl + net_short_pnl;

    let long_wins = count_kind(longs, ExitKind::Win);
    let short_wins = count_kind(shorts, ExitKind::Win);
    let profitability_longs = long_wins as f64 / num_longs as f64;
    let profitability_shorts = short_wins as f64 / num_shorts as f64;
    let profitability_total = (long_wins + short_wins) as f64 / (num_longs + num_shorts) as f64;

    match config.mode {
        ScoreMode::Base => {
            if net_pnl < config.pnl_floor {
                return Ok(ScoreOutcome::Pruned(PruneReason::PnlFloor));
            }
        }
        ScoreMode::Strict => {
            if profitability_total < config.min_profitability || net_pnl < 0.0 {
                return Ok(ScoreOutcome::Pruned(PruneReason::Profitability));
            }
        }
    }

    //average trade duration over resolved positions of both sides
    let durations: Vec<Duration> = longs
        .iter()
        .chain(shorts.iter())
        .filter_map(|p| p.duration())
        .collect();
    if durations.is_empty() {
        return Err(MetricError::Undefined {
            settings: settings.to_string(),
            metric: "average_trade_time",
        });
    }
    let total_millis: i64 = durations.iter().map(|d| d.num_milliseconds()).sum();
    let average_trade_time = Duration::milliseconds(total_millis / durations.len() as i64);

    //pnl distribution over every position carrying a pnl, open entries
    //included at zero
    let pnls: Vec<f64> = longs
        .iter()
        .chain(shorts.iter())
        .filter_map(|p| p.pnl)
        .collect();
    let max_profit = pnls.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max_drawdown = pnls.iter().copied().fold(f64::INFINITY, f64::min);
    let average_pnl = pnls.as_slice().mean();

    if max_drawdown == 0.0 {
        return Err(MetricError::Undefined {
            settings: settings.to_string(),
            metric: "risk_ratio",
        });
    }
    let risk_ratio = average_pnl / max_drawdown.abs();

    //peak concurrent exposure as recorded at entry time
    let long_max_concurrent = longs.iter().map(|p| p.open_lots).max().unwrap_or(0);
    let short_max_concurrent = shorts.iter().map(|p| p.open_lots).min().unwrap_or(0);

    //a side with exactly zero net pnl means no real activity there
    if net_long_pnl == 0.0 || net_short_pnl == 0.0 {
        return Ok(ScoreOutcome::Dropped);
    }

    Ok(ScoreOutcome::Record(SummaryRecord {
        settings: settings.to_string(),
        net_long_pnl,
        net_short_pnl,
        net_pnl,
        profitability_longs,
        profitability_shorts,
        profitability_total,
        num_trades: num_longs + num_shorts,
        num_longs,
        num_shorts,
        max_profit,
        max_drawdown,
        average_pnl,
        risk_ratio,
        average_trade_time,
        long_max_concurrent,
        short_max_concurrent,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn win(entry: i64, exit: i64, entry_price: f64, pnl: f64, open_lots: i64) -> Position {
        Position::resolved(
            ts(entry),
            ts(exit),
            entry_price,
            entry_price + 9.0,
            entry_price - 3.0,
            ExitKind::Win,
            pnl,
            open_lots,
        )
    }

    fn loss(entry: i64, exit: i64, entry_price: f64, pnl: f64) -> Position {
        Position::resolved(
            ts(entry),
            ts(exit),
            entry_price,
            entry_price + 9.0,
            entry_price - 3.0,
            ExitKind::Loss,
            pnl,
            0,
        )
    }

    fn config() -> ScoreConfig {
        ScoreConfig::default()
    }

    #[test]
    fn test_empty_side_prunes() {
        let contract = ContractSpec::crude();
        let longs = vec![win(0, 60, 100.0, 900.0, 0)];

        let outcome = score("s", &longs, &[], &contract, &config()).unwrap();
        assert_eq!(outcome, ScoreOutcome::Pruned(PruneReason::EmptySide));

        let outcome = score("s", &[], &longs, &contract, &config()).unwrap();
        assert_eq!(outcome, ScoreOutcome::Pruned(PruneReason::EmptySide));
    }

    #[test]
    fn test_unresolved_side_prunes() {
        let contract = ContractSpec::crude();
        let longs = vec![win(0, 60, 100.0, 900.0, 0)];
        let shorts = vec![Position::left_open(ts(0), 100.0, 91.0, 103.0, 0)];

        let outcome = score("s", &longs, &shorts, &contract, &config()).unwrap();
        assert_eq!(outcome, ScoreOutcome::Pruned(PruneReason::NoResolvedTrades));
    }

    #[test]
    fn test_pnl_floor_prunes_in_base_mode() {
        let contract = ContractSpec::crude();
        let longs = vec![loss(0, 60, 100.0, -5000.0)];
        let shorts = vec![
            Position::resolved(ts(0), ts(60), 100.0, 91.0, 103.0, ExitKind::Loss, -2000.0, 0),
        ];

        let outcome = score("s", &longs, &shorts, &contract, &config()).unwrap();
        assert_eq!(outcome, ScoreOutcome::Pruned(PruneReason::PnlFloor));
    }

    #[test]
    fn test_strict_mode_prunes_low_profitability() {
        let contract = ContractSpec::crude();
        //one win, three losses: profitability 0.25, net positive
        let longs = vec![win(0, 60, 100.0, 9000.0, 0), loss(100, 160, 100.0, -300.0)];
        let shorts = vec![
            Position::resolved(ts(0), ts(60), 100.0, 91.0, 103.0, ExitKind::Loss, -300.0, 0),
            Position::resolved(ts(100), ts(160), 100.0, 91.0, 103.0, ExitKind::Loss, -300.0, 0),
        ];
        let config = ScoreConfig {
            mode: ScoreMode::Strict,
            ..ScoreConfig::default()
        };

        let outcome = score("s", &longs, &shorts, &contract, &config).unwrap();
        assert_eq!(outcome, ScoreOutcome::Pruned(PruneReason::Profitability));
    }

    #[test]
    fn test_strict_mode_prunes_negative_net() {
        let contract = ContractSpec::crude();
        let longs = vec![win(0, 60, 100.0, 900.0, 0)];
        let shorts = vec![
            Position::resolved(ts(0), ts(60), 100.0, 91.0, 103.0, ExitKind::Loss, -2000.0, 0),
        ];
        let config = ScoreConfig {
            mode: ScoreMode::Strict,
            ..ScoreConfig::default()
        };

        let outcome = score("s", &longs, &shorts, &contract, &config).unwrap();
        assert_eq!(outcome, ScoreOutcome::Pruned(PruneReason::Profitability));
    }

    #[test]
    fn test_record_fields() {
        let contract = ContractSpec::crude();
        let longs = vec![
            win(0, 120, 100.0, 900.0, 0),
            loss(200, 260, 100.0, -300.0),
            //open entry contributes zero pnl and its turnover
            Position::left_open(ts(300), 100.0, 109.0, 97.0, 2),
        ];
        let shorts = vec![
            Position::resolved(ts(0), ts(60), 100.0, 91.0, 103.0, ExitKind::Win, 900.0, -1),
        ];

        let outcome = score("label", &longs, &shorts, &contract, &config()).unwrap();
        let record = match outcome {
            ScoreOutcome::Record(record) => record,
            other => panic!("expected record, got {:?}", other),
        };

        assert_eq!(record.settings, "label");
        assert_eq!(record.num_longs, 2);
        assert_eq!(record.num_shorts, 1);
        assert_eq!(record.num_trades, 3);
        assert_eq!(record.profitability_longs, 0.5);
        assert_eq!(record.profitability_shorts, 1.0);
        assert!((record.profitability_total - 2.0 / 3.0).abs() < 1e-12);

        //brokerage: three long entries and one short entry at 100.0, lots 1
        let long_brokerage = contract.brokerage(300.0);
        let short_brokerage = contract.brokerage(100.0);
        assert!((record.net_long_pnl - (600.0 - long_brokerage)).abs() < 1e-9);
        assert!((record.net_short_pnl - (900.0 - short_brokerage)).abs() < 1e-9);

        assert_eq!(record.max_profit, 900.0);
        assert_eq!(record.max_drawdown, -300.0);
        //pnls: 900, -300, 0, 900
        assert!((record.average_pnl - 375.0).abs() < 1e-12);
        assert!((record.risk_ratio - 375.0 / 300.0).abs() < 1e-12);

        //durations: 120, 60, 60 seconds
        assert_eq!(record.average_trade_time, Duration::seconds(80));

        assert_eq!(record.long_max_concurrent, 2);
        assert_eq!(record.short_max_concurrent, -1);
    }

    #[test]
    fn test_zero_drawdown_is_undefined() {
        let contract = ContractSpec::crude();
        let longs = vec![
            win(0, 60, 100.0, 900.0, 0),
            //open entry drags the pnl minimum to exactly zero
            Position::left_open(ts(100), 100.0, 109.0, 97.0, 0),
        ];
        let shorts = vec![
            Position::resolved(ts(0), ts(60), 100.0, 91.0, 103.0, ExitKind::Win, 900.0, 0),
        ];

        let result = score("s", &longs, &shorts, &contract, &config());
        assert!(matches!(
            result,
            Err(MetricError::Undefined {
                metric: "risk_ratio",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_net_side_drops_without_pruning() {
        let contract = ContractSpec::crude();
        let longs = vec![win(0, 60, 100.0, 900.0, 0)];
        //short pnls cancel exactly and the zero entry price keeps the
        //brokerage at zero, so the short side nets out to exactly zero
        let shorts = vec![
            Position::resolved(ts(0), ts(60), 0.0, -9.0, 3.0, ExitKind::Win, 500.0, 0),
            Position::resolved(ts(100), ts(160), 0.0, -9.0, 3.0, ExitKind::Loss, -500.0, 0),
        ];

        let outcome = score("s", &longs, &shorts, &contract, &config()).unwrap();
        assert_eq!(outcome, ScoreOutcome::Dropped);
    }

    #[test]
    fn test_rejected_entries_do_not_affect_totals() {
        let contract = ContractSpec::crude();
        let base_longs = vec![win(0, 60, 100.0, 900.0, 0)];
        let shorts = vec![
            Position::resolved(ts(0), ts(60), 100.0, 91.0, 103.0, ExitKind::Win, 900.0, 0),
        ];

        let mut noisy_longs = base_longs.clone();
        noisy_longs.push(Position::rejected(ts(100), ExitKind::Overlap, 0));
        noisy_longs.push(Position::rejected(ts(200), ExitKind::LotLimit, 3));

        let base = score("s", &base_longs, &shorts, &contract, &config()).unwrap();
        let noisy = score("s", &noisy_longs, &shorts, &contract, &config()).unwrap();

        let (base_record, noisy_record) = match (base, noisy) {
            (ScoreOutcome::Record(a), ScoreOutcome::Record(b)) => (a, b),
            other => panic!("expected records, got {:?}", other),
        };

        assert_eq!(base_record.net_long_pnl, noisy_record.net_long_pnl);
        assert_eq!(base_record.num_longs, noisy_record.num_longs);
        //the rejected pyramided entry still raises the concurrency peak
        assert_eq!(noisy_record.long_max_concurrent, 3);
    }
}
