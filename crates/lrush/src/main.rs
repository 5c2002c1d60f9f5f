//! lrush - replay cache scripts against an LRU cache

mod command;
mod handler;
mod script;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lrucache::SharedLruCache;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::handler::{CommandHandler, Reply};
use crate::script::{open_script, run_script};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of items)
    #[arg(short, long, default_value_t = 1024)]
    capacity: usize,

    /// Script file to replay (reads stdin when omitted)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "lrucache=trace" (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Print cache statistics after the run
    #[arg(long)]
    stats: bool,
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
    };

    // Replies go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    info!("Starting lrush v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);

    let cache = Arc::new(
        SharedLruCache::new(args.capacity).context("failed to create cache")?,
    );
    let handler = CommandHandler::new(cache);

    let input = open_script(args.script.as_deref())?;
    let summary = run_script(&handler, input, io::stdout().lock())?;
    info!(
        executed = summary.executed,
        malformed = summary.malformed,
        "Replay complete"
    );

    if args.stats {
        println!("{}", handler.handle(command::Command::Stats));
    }

    if summary.malformed > 0 {
        eprintln!("{}", Reply::Error(format!("{} malformed line(s)", summary.malformed)));
    }

    Ok(())
}
