//! Blocking cache simulator CLI.
//!
//! This binary drives the cache model from an access trace. It performs:
//! 1. **Setup:** Load a JSON configuration (or use defaults) and a trace file.
//! 2. **Run:** Feed each trace entry to its requestor and run until the system drains.
//! 3. **Report:** Print the cache statistics as a text table or as JSON.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use simcache_core::common::{CacheError, Tick};
use simcache_core::config::Config;
use simcache_core::sim::{System, load_trace};

#[derive(Parser, Debug)]
#[command(
    name = "simcache",
    author,
    version,
    about = "Single-level blocking cache simulator",
    long_about = "Replay an access trace through a blocking cache and report hit/miss statistics.\n\nTrace lines are `<port> <R|W> <hex addr> <size>`; `#` starts a comment.\n\nExamples:\n  simcache run --trace accesses.trace\n  simcache run --trace accesses.trace --config cache.json --json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and print statistics.
    Run {
        /// Access trace to replay.
        #[arg(short, long)]
        trace: PathBuf,

        /// JSON configuration; built-in defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print statistics as JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Stop once the next activity lies past this tick.
        #[arg(long)]
        max_ticks: Option<Tick>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            trace,
            config,
            json,
            max_ticks,
        } => cmd_run(&trace, config.as_deref(), json, max_ticks),
    };

    if let Err(e) = result {
        error!("{e}");
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Loads everything, runs the system, and prints the report.
fn cmd_run(
    trace: &Path,
    config: Option<&Path>,
    as_json: bool,
    max_ticks: Option<Tick>,
) -> Result<(), CacheError> {
    let config = match config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let entries = load_trace(trace)?;
    info!(entries = entries.len(), trace = %trace.display(), "loaded trace");

    let mut system = System::new(&config)?;
    system.load_trace(entries)?;
    let end = system.run(max_ticks)?;

    if as_json {
        print_json(&system, end)?;
    } else {
        print_table(&system, end);
    }
    Ok(())
}

fn print_json(system: &System, end: Tick) -> Result<(), CacheError> {
    let stats = system.cache().stats();
    let report = json!({
        "ticks": end,
        "drained": system.is_quiescent(),
        "hit_ratio": stats.hit_ratio(),
        "stats": stats,
        "memory": {
            "reads": system.memory().reads,
            "writes": system.memory().writes,
            "writebacks": system.memory().writebacks,
        },
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_table(system: &System, end: Tick) {
    let stats = system.cache().stats();
    let hist = &stats.miss_latency;

    println!("==========================================================");
    println!("CACHE SIMULATION STATISTICS");
    println!("==========================================================");
    println!("sim_ticks                {end}");
    println!("drained                  {}", system.is_quiescent());
    println!("----------------------------------------------------------");
    println!("CACHE");
    println!("  cache.hits             {}", stats.hits);
    println!("  cache.misses           {}", stats.misses);
    match stats.hit_ratio() {
        Some(ratio) => println!("  cache.hit_ratio        {ratio:.4}"),
        None => println!("  cache.hit_ratio        n/a"),
    }
    println!("----------------------------------------------------------");
    println!("MISS LATENCY (bucket width {} ticks)", hist.bucket_size());
    for (i, count) in hist.buckets().iter().enumerate() {
        let (low, high) = hist.bucket_bounds(i);
        println!("  {low:>8}-{high:<8}     {count}");
    }
    if let Some(mean) = hist.mean() {
        println!("  mean                   {mean:.2}");
    }
    println!("----------------------------------------------------------");
    println!("MEMORY");
    println!("  mem.reads              {}", system.memory().reads);
    println!("  mem.writes             {}", system.memory().writes);
    println!("  mem.writebacks         {}", system.memory().writebacks);
    println!("==========================================================");
}
