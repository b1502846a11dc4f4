#![deny(clippy::correctness)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::nursery,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::cast_lossless
)]
//! CLI for scGraph, the graph-based evaluation of single-cell embeddings.

mod commands;
mod metrics;

use std::path::{Path, PathBuf};

use clap::Parser;
use ftlog::{
    appender::{FileAppender, Period},
    LevelFilter, LoggerGuard,
};

use commands::Commands;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The random seed for the PCA. [default: 42]
    #[arg(short('s'), long)]
    seed: Option<u64>,

    /// The name of the log file.
    #[arg(short('l'), long, default_value = "scgraph")]
    log_name: String,

    /// The directory for the log files.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Also log debug messages, such as per-batch progress.
    #[arg(short('v'), long, default_value_t = false)]
    verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let (_guard, log_path) = configure_logger(&args.log_dir, &args.log_name, level)?;
    println!("Log file: {log_path:?}");
    ftlog::info!("Args: {args:?}");

    let seed = args.seed;

    match args.command {
        Commands::Evaluate {
            inp_dir,
            out_path,
            detail_out,
            consensus_out,
            params_out,
            options,
        } => {
            let params = options.into_params(seed)?;
            if let Some(path) = params_out {
                params.write_json(&path)?;
                ftlog::info!("Wrote parameters to {path:?}");
            }
            commands::evaluate_embeddings(
                &inp_dir,
                out_path.as_deref(),
                detail_out.as_deref(),
                consensus_out.as_deref(),
                params,
            )?;
        }
        Commands::Consensus {
            inp_dir,
            out_path,
            options,
        } => commands::write_consensus(&inp_dir, &out_path, options.into_params(seed)?)?,
    }

    Ok(())
}

/// Starts logging to `<log_dir>/<file_name>.log`, rotated daily. Problems
/// with the appender itself go to a sibling `.err.log` file.
///
/// # Errors
///
/// * If the log directory cannot be created.
/// * If a logger is already installed.
fn configure_logger(
    log_dir: &Path,
    file_name: &str,
    level: LevelFilter,
) -> Result<(LoggerGuard, PathBuf), String> {
    std::fs::create_dir_all(log_dir).map_err(|e| format!("Cannot create {log_dir:?}: {e}"))?;
    let log_path = log_dir
        .canonicalize()
        .map_err(|e| e.to_string())?
        .join(file_name)
        .with_extension("log");
    let err_path = log_path.with_extension("err.log");

    let guard = ftlog::Builder::new()
        .max_log_level(level)
        .root(FileAppender::rotate(&log_path, Period::Day))
        .filter("ftlog::appender", "appender-errors", LevelFilter::Warn)
        .appender("appender-errors", FileAppender::new(err_path))
        .try_init()
        .map_err(|e| e.to_string())?;

    Ok((guard, log_path))
}
