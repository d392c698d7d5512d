use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    time::Instant,
};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use partial_order_discovery::{
    determine_concurrency_with_matrix, determine_concurrency_with_relation,
    ConcurrencyOracleConfig, ConcurrencyRelation, EventLog, Importable, PartialOrderTrace,
    PetriNet,
};

/// Discover the partial orders behind the trace variants of an event log
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Event log (`.json` array of traces, or `.txt`/`.log` with one trace per line)
    log: PathBuf,

    /// Number of preceding activities every activity is related to
    #[arg(short = 'l', long, default_value_t = 1)]
    look_ahead_distance: usize,

    /// Drop trace variants that are a strict prefix of another variant
    #[arg(long)]
    discard_prefixes: bool,

    /// Concurrent events given as `a[1]||b[2]` lines, instead of deriving them from the log
    #[arg(short, long)]
    concurrency: Option<PathBuf>,

    /// Keep the artificial start and end activities
    #[arg(long)]
    add_start_stop: bool,

    /// Write events and their precedence relations instead of Petri nets
    #[arg(long)]
    as_events: bool,

    /// Write the partial orders as JSON to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// More log output (-v: info, -vv: debug, -vvv: trace); `RUST_LOG` takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();

    let now = Instant::now();
    let log = EventLog::import_from_path(&args.log)
        .with_context(|| format!("Importing event log {}", args.log.display()))?;
    log::info!(
        "Imported {} traces in {:#?}",
        log.traces.len(),
        now.elapsed()
    );

    let config = ConcurrencyOracleConfig {
        look_ahead_distance: args.look_ahead_distance,
        discard_prefixes: args.discard_prefixes,
        add_start_stop_event: args.add_start_stop,
    };
    let now = Instant::now();
    let partial_orders = match &args.concurrency {
        Some(path) => {
            let relation = ConcurrencyRelation::import_from_path(path)
                .with_context(|| format!("Importing concurrency relation {}", path.display()))?;
            log::info!("Imported {} concurrent pairs", relation.len());
            determine_concurrency_with_relation(&log.traces, &relation, &config)
        }
        None => determine_concurrency_with_matrix(&log.traces, &config)
            .map(|result| result.partial_orders),
    };
    let partial_orders = partial_orders.context("Determining concurrency")?;
    log::info!(
        "Discovered {} partial orders in {:#?}",
        partial_orders.len(),
        now.elapsed()
    );
    for (i, po) in partial_orders.iter().enumerate() {
        log::debug!(
            "Partial order {i}: {} transitions, {} places, frequency {}",
            po.number_of_transitions(),
            po.number_of_places(),
            po.frequency()
        );
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Creating output file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_partial_orders(&mut writer, &partial_orders, args.as_events)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            write_partial_orders(&mut writer, &partial_orders, args.as_events)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn write_partial_orders<W: Write>(writer: W, nets: &[PetriNet], as_events: bool) -> Result<()> {
    let res = if as_events {
        let events: Vec<PartialOrderTrace> =
            nets.iter().map(PartialOrderTrace::from_petri_net).collect();
        serde_json::to_writer_pretty(writer, &events)
    } else {
        serde_json::to_writer_pretty(writer, nets)
    };
    res.context("Writing partial orders")
}
