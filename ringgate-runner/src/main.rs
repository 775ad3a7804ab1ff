//! Command line runner for a producer/consumer run over a bounded ring.
//!
//! Loads the run configuration, installs tracing, starts the async runtime and prints a summary
//! comparing produced and consumed items once every worker has stopped.

use std::process::ExitCode;

use clap::Parser;
use ringgate::report::RunSummary;
use ringgate_config::shared::RunConfig;
use ringgate_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_run_config;
use crate::core::start_run_with_config;
use crate::error::{RunnerError, RunnerResult};

mod config;
mod core;
mod error;

#[derive(Debug, Parser)]
#[command(
    name = "ringgate",
    version,
    about = "Runs producers and consumers over a bounded ring buffer",
    arg_required_else_help = true
)]
struct Args {
    /// Number of producer workers, from 1 to `workers.max_producers`.
    #[arg(value_name = "NUM_PRODUCERS")]
    producers: usize,

    /// Number of consumer workers, from 1 to `workers.max_consumers`.
    #[arg(value_name = "NUM_CONSUMERS")]
    consumers: usize,
}

/// Entry point for the runner.
///
/// Exits with 0 once the run completed, even when the totals do not match, with 2 on invalid
/// arguments or configuration and with 1 on any other failure.
fn main() -> ExitCode {
    // Usage errors exit here with clap's status 2.
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: Args) -> RunnerResult<()> {
    let config = load_run_config()?;

    let log_flusher = init_tracing(env!("CARGO_BIN_NAME")).map_err(RunnerError::logging)?;

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(config, args));

    // Flushes pending log lines so the summary is printed last.
    drop(log_flusher);

    let summary = result?;
    println!("{summary}");

    Ok(())
}

async fn async_main(config: RunConfig, args: Args) -> RunnerResult<RunSummary> {
    match start_run_with_config(config, args.producers, args.consumers).await {
        Ok(summary) => Ok(summary),
        Err(err) => {
            error!("{err}");
            Err(err)
        }
    }
}
