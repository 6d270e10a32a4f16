use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prettytable::{Cell, Row, Table};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vindaloo::prelude::*;

#[derive(Parser)]
#[command(name = "vindaloo")]
#[command(about = "A Rust-based parameter-sweep backtesting engine for two-sided futures strategies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a parameter sweep
    Sweep {
        //path to the bid-side csv (fills long exits, names the outputs)
        #[arg(long)]
        bid: PathBuf,

        //path to the ask-side csv (generates signals, fills short exits)
        #[arg(long)]
        ask: PathBuf,

        //path to a sweep configuration json; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        //scoring mode (base, strict)
        #[arg(long)]
        mode: Option<String>,

        //lots entered per signal
        #[arg(long)]
        lots: Option<u32>,

        //maximum lots open on one side at any time
        #[arg(long)]
        max_lots: Option<u32>,

        //evaluate independent cells in parallel
        #[arg(long)]
        parallel: bool,

        //skip combinations with undefined arithmetic instead of halting
        #[arg(long)]
        skip_undefined: bool,

        //output directory for the result csv and trade dumps
        #[arg(long, default_value = "results")]
        out: PathBuf,

        //number of top combinations to print
        #[arg(long, default_value = "15")]
        top: usize,

        //write the effective configuration to this path and exit
        #[arg(long)]
        write_config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            bid,
            ask,
            config,
            mode,
            lots,
            max_lots,
            parallel,
            skip_undefined,
            out,
            top,
            write_config,
        } => {
            run_sweep(
                bid,
                ask,
                config,
                mode,
                lots,
                max_lots,
                parallel,
                skip_undefined,
                out,
                top,
                write_config,
            )?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_sweep(
    bid_path: PathBuf,
    ask_path: PathBuf,
    config_path: Option<PathBuf>,
    mode: Option<String>,
    lots: Option<u32>,
    max_lots: Option<u32>,
    parallel: bool,
    skip_undefined: bool,
    out_dir: PathBuf,
    top: usize,
    write_config: Option<PathBuf>,
) -> Result<()> {
    println!("Vindaloo Parameter-Sweep Backtesting Engine");
    println!("===========================================\n");

    //assemble configuration
    let mut config = match &config_path {
        Some(path) => SweepConfiguration::from_json_file(path)
            .context(format!("Failed to load configuration from {:?}", path))?,
        None => SweepConfiguration::default(),
    };

    if let Some(mode) = mode {
        config.mode = ScoreMode::parse(&mode)
            .ok_or_else(|| anyhow::anyhow!("Unknown scoring mode: {}", mode))?;
    }
    if let Some(lots) = lots {
        config.lots = lots;
    }
    if let Some(max_lots) = max_lots {
        config.max_lots = max_lots;
    }
    if skip_undefined {
        config.skip_undefined = true;
    }

    if let Some(path) = write_config {
        config
            .to_json_file(&path)
            .context(format!("Failed to write configuration to {:?}", path))?;
        println!("Configuration written to {:?}", path);
        return Ok(());
    }

    //load data
    println!("Loading bid series from {:?}...", bid_path);
    let bid = load_csv(&bid_path)?;
    println!("Loading ask series from {:?}...", ask_path);
    let ask = load_csv(&ask_path)?;

    println!(
        "Loaded {} bid bars and {} ask bars",
        bid.len(),
        ask.len()
    );
    println!(
        "Ask date range: {} to {}\n",
        ask.bars[0].timestamp,
        ask.bars[ask.len() - 1].timestamp
    );

    println!(
        "Contract: {} (point value: {}, cost: {} ppb)",
        config.contract.symbol, config.contract.point_value, config.contract.cost_per_notional_ppb
    );
    println!(
        "Mode: {:?}, lots: {}, max lots: {}\n",
        config.mode, config.lots, config.max_lots
    );

    //run the sweep
    println!("Running sweep...\n");
    let engine = SweepEngine::new(&ask, &bid, &config);
    let outcome = if parallel {
        engine.run_parallel()?
    } else {
        engine.run()?
    };

    //persist outputs keyed by the bid series name
    let result_path = write_results(&out_dir, &bid.name, &outcome.records)?;
    let dump_dir = write_trade_dumps(&out_dir, &bid.name, &outcome.dumps)?;

    println!("Sweep Results");
    println!("=============\n");
    println!(
        "{} surviving combinations out of {} evaluated",
        outcome.records.len(),
        outcome.dumps.len()
    );
    println!("Results saved to {:?}", result_path);
    println!("Trade dumps saved to {:?}\n", dump_dir);

    if outcome.records.is_empty() {
        println!("No combination survived the pruning rules.");
        return Ok(());
    }

    print_top_records(&outcome.records, top);

    Ok(())
}

//prints the best combinations by net pnl in a formatted table
fn print_top_records(records: &[SummaryRecord], top: usize) {
    let mut sorted: Vec<&SummaryRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.net_pnl
            .partial_cmp(&a.net_pnl)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Settings"),
        Cell::new("Net PnL"),
        Cell::new("Prof."),
        Cell::new("Trades"),
        Cell::new("Max DD"),
        Cell::new("Risk"),
    ]));

    for record in sorted.iter().take(top) {
        table.add_row(Row::new(vec![
            Cell::new(&record.settings),
            Cell::new(&format!("{:.2}", record.net_pnl)),
            Cell::new(&format!("{:.2}%", record.profitability_total * 100.0)),
            Cell::new(&format!("{}", record.num_trades)),
            Cell::new(&format!("{:.2}", record.max_drawdown)),
            Cell::new(&format!("{:.3}", record.risk_ratio)),
        ]));
    }

    table.printstd();
}
