//! `zit` - run a zero-intelligence double auction from the command line.
//!
//! Loads a JSON config (or the defaults), applies flag overrides, runs the
//! market and prints a per-period summary against the theoretical
//! equilibrium. `--report` writes the full run as JSON for plotting;
//! `--record-dir` writes the trade/period/exhausted event tables as parquet.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use zit_core::{Equilibrium, RunReport, Simulation, SimulationConfig, TraderId};

/// Zero-intelligence traders in a continuous double auction
#[derive(Parser, Debug)]
#[command(name = "zit")]
#[command(about = "Zero-intelligence traders in a continuous double auction")]
#[command(version)]
struct Args {
    /// JSON config file; built-in defaults are used when omitted
    #[arg(long, short, env = "ZIT_CONFIG")]
    config: Option<PathBuf>,

    /// Number of periods to run
    #[arg(long)]
    periods: Option<usize>,

    /// Seconds per period
    #[arg(long)]
    timeout: Option<f64>,

    /// Random seed (0 draws one from OS entropy)
    #[arg(long, env = "ZIT_SEED")]
    seed: Option<u64>,

    /// Let traders quote outside their own valuation
    #[arg(long)]
    unconstrained: bool,

    /// Run constrained and unconstrained populations from the same seed
    #[arg(long)]
    compare: bool,

    /// Print every period's transaction ledger
    #[arg(long, short)]
    verbose: bool,

    /// Write the full run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write recorded event tables as parquet under this directory
    #[cfg(feature = "instrument")]
    #[arg(long)]
    record_dir: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut SimulationConfig) {
        if let Some(periods) = self.periods {
            config.periods = periods;
        }
        if let Some(timeout) = self.timeout {
            config.misc.timeout = timeout;
        }
        if let Some(seed) = self.seed {
            config.misc.random_seed = Some(seed);
        }
        if self.unconstrained {
            config.constrained = false;
        }
        if self.verbose {
            config.misc.quiet = false;
        }
    }

    /// Event recording layer, present only when the tables will be written.
    #[cfg(feature = "instrument")]
    fn ledger_layer(&self) -> Option<zit_core::instrument::LedgerLayer> {
        self.record_dir
            .as_ref()
            .map(|_| zit_core::instrument::LedgerLayer)
    }
}

#[cfg_attr(not(feature = "instrument"), allow(unused_variables))]
fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(fmt);
    #[cfg(feature = "instrument")]
    let registry = registry.with(args.ledger_layer());
    registry.init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    args.apply(&mut config);
    let params = config.validate().context("invalid configuration")?;
    let quiet = params.quiet;

    let sim = Simulation::new(params);

    #[cfg(feature = "instrument")]
    let recorder = args
        .record_dir
        .as_ref()
        .map(|dir| zit_core::instrument::ScopedRecorder::new(dir, &format!("seed_{}", sim.seed())));

    let (reports, json) = if args.compare {
        let comparison = sim.run_comparison()?;
        let json = serde_json::to_string_pretty(&comparison)?;
        (vec![comparison.constrained, comparison.unconstrained], json)
    } else {
        let report = sim.run()?;
        let json = report.to_json()?;
        (vec![report], json)
    };

    for report in &reports {
        if !quiet {
            print_ledgers(report);
        }
        print_summary(report);
    }

    if let Some(path) = &args.report {
        std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?;
        println!("report written to {}", path.display());
    }

    #[cfg(feature = "instrument")]
    {
        if let Some(recorder) = recorder {
            let dir = recorder.run_dir().to_path_buf();
            let tables = recorder
                .save()
                .with_context(|| format!("writing event tables to {}", dir.display()))?;
            println!("{} event tables written to {}", tables, dir.display());
        }
    }

    Ok(())
}

fn print_ledgers(report: &RunReport) {
    let names: HashMap<TraderId, &str> = report
        .population
        .traders()
        .iter()
        .map(|t| (t.id, t.name.as_str()))
        .collect();
    let name = |id: TraderId| names.get(&id).copied().unwrap_or("?");

    for record in &report.run.periods {
        println!("Transaction ledger {}:", record.period + 1);
        println!("Bid\tBidder\tAsk\tSeller\tPrice\tBidder profit\tSeller profit");
        for trade in &record.ledger.trades {
            println!(
                "{:3}\t{:^7.7}\t{:3}\t{:^7.7}\t{:4}\t{:7}\t\t{:7}",
                trade.bid,
                name(trade.bidder),
                trade.ask,
                name(trade.seller),
                trade.price,
                trade.bidder_profit,
                trade.seller_profit,
            );
        }
        println!("{}", record.ledger.outcome.describe());
        println!();
    }
}

fn print_summary(report: &RunReport) {
    let mode = if report.constrained {
        "constrained"
    } else {
        "unconstrained"
    };
    println!(
        "{} traders ({}), seed {}, prices [{}, {}]",
        report.population.traders().len(),
        mode,
        report.seed,
        report.bounds.min(),
        report.bounds.max(),
    );
    match report.curves.equilibrium {
        Equilibrium::Cleared { quantity, price } => println!(
            "equilibrium: quantity {}, price {}, max surplus {}",
            quantity, price, report.curves.max_surplus
        ),
        Equilibrium::NoCrossing => println!(
            "equilibrium: supply and demand do not cross, max surplus {}",
            report.curves.max_surplus
        ),
    }
    for summary in &report.summaries {
        let mean = summary
            .mean_price
            .map(|p| format!("{:.1}", p))
            .unwrap_or_else(|| "-".to_string());
        let efficiency = summary
            .efficiency
            .map(|e| format!("{:.1}%", e * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  period {:>3}: {:>4} trades, mean price {:>7}, surplus {:>6}, efficiency {:>6} ({})",
            summary.period + 1,
            summary.trades,
            mean,
            summary.surplus,
            efficiency,
            summary.outcome.describe(),
        );
    }
}
