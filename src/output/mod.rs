use crate::engine::Position;
use crate::metrics::SummaryRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::io::Write;
use std::path::{Path, PathBuf};

fn fmt_opt_price(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_opt_time(value: Option<DateTime<Utc>>) -> String {
    value.map(|t| t.to_rfc3339()).unwrap_or_default()
}

//writes the summary rows of a sweep to result_<label>.csv under out_dir
pub fn write_results(
    out_dir: &Path,
    series_label: &str,
    records: &[SummaryRecord],
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .context(format!("Failed to create output directory {:?}", out_dir))?;

    let path = out_dir.join(format!("result_{}.csv", series_label));
    let mut file = std::fs::File::create(&path)
        .context(format!("Failed to create result file {:?}", path))?;

    writeln!(
        file,
        "settings,netlongpnl,netshortpnl,netpnl,profitability_longs,profitability_shorts,\
         profitability_total,number_of_trades,num_longs,num_shorts,max_profit,max_DD,\
         average_pnl,apnl_per_max_DD,average_trade_secs,long_max_concurrent,short_max_concurrent"
    )?;

    for record in records {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            record.settings,
            record.net_long_pnl,
            record.net_short_pnl,
            record.net_pnl,
            record.profitability_longs,
            record.profitability_shorts,
            record.profitability_total,
            record.num_trades,
            record.num_longs,
            record.num_shorts,
            record.max_profit,
            record.max_drawdown,
            record.average_pnl,
            record.risk_ratio,
            record.average_trade_time.num_milliseconds() as f64 / 1000.0,
            record.long_max_concurrent,
            record.short_max_concurrent
        )?;
    }

    Ok(path)
}

//writes one csv per settings label under out_dir/<series_label>/
//every position is kept, suppressed entries included
pub fn write_trade_dumps(
    out_dir: &Path,
    series_label: &str,
    dumps: &IndexMap<String, Vec<Position>>,
) -> Result<PathBuf> {
    let dir = out_dir.join(series_label);
    std::fs::create_dir_all(&dir)
        .context(format!("Failed to create trade dump directory {:?}", dir))?;

    for (settings, positions) in dumps {
        let path = dir.join(format!("{}.csv", settings));
        let mut file = std::fs::File::create(&path)
            .context(format!("Failed to create trade dump {:?}", path))?;

        writeln!(
            file,
            "timestamp_of_entry,timestamp_of_exit,entry_price,target_price,stop_price,\
             type_of_exit,pnl,open_lots"
        )?;

        for position in positions {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{}",
                position.entry_time.to_rfc3339(),
                fmt_opt_time(position.exit_time),
                fmt_opt_price(position.entry_price),
                fmt_opt_price(position.target_price),
                fmt_opt_price(position.stop_price),
                position.exit_kind,
                fmt_opt_price(position.pnl),
                position.open_lots
            )?;
        }
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExitKind;
    use chrono::{Duration, TimeZone};

    fn record(settings: &str) -> SummaryRecord {
        SummaryRecord {
            settings: settings.to_string(),
            net_long_pnl: 891.62,
            net_short_pnl: 891.62,
            net_pnl: 1783.24,
            profitability_longs: 1.0,
            profitability_shorts: 1.0,
            profitability_total: 1.0,
            num_trades: 2,
            num_longs: 1,
            num_shorts: 1,
            max_profit: 900.0,
            max_drawdown: -300.0,
            average_pnl: 300.0,
            risk_ratio: 1.0,
            average_trade_time: Duration::seconds(90),
            long_max_concurrent: 0,
            short_max_concurrent: 0,
        }
    }

    #[test]
    fn test_write_results_layout() {
        let dir = tempfile::tempdir().unwrap();

        let path = write_results(dir.path(), "bid_file", &[record("a"), record("b")]).unwrap();

        assert_eq!(path, dir.path().join("result_bid_file.csv"));
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("settings,netlongpnl"));
        assert!(lines[1].starts_with("a,891.62"));
        assert!(lines[1].ends_with(",90,0,0"));
    }

    #[test]
    fn test_write_trade_dumps_layout() {
        let dir = tempfile::tempdir().unwrap();
        let entry = Utc.timestamp_opt(0, 0).unwrap();

        let mut dumps = IndexMap::new();
        dumps.insert(
            "overlap_true-stop_300".to_string(),
            vec![
                Position::left_open(entry, 100.0, 109.0, 97.0, 0),
                Position::rejected(entry, ExitKind::LotLimit, 3),
            ],
        );

        let written = write_trade_dumps(dir.path(), "bid_file", &dumps).unwrap();

        assert_eq!(written, dir.path().join("bid_file"));
        let dump_path = written.join("overlap_true-stop_300.csv");
        let contents = std::fs::read_to_string(dump_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Open"));
        assert!(lines[2].contains("Lot limit"));
        //a rejected entry carries empty price fields
        assert!(lines[2].contains(",,,,"));
    }
}
