use ringgate::pipeline::Pipeline;
use ringgate::report::RunSummary;
use ringgate_config::shared::RunConfig;
use tracing::{info, warn};

use crate::error::RunnerResult;

/// Builds a pipeline for `producers` and `consumers` workers and runs it to completion.
pub async fn start_run_with_config(
    config: RunConfig,
    producers: usize,
    consumers: usize,
) -> RunnerResult<RunSummary> {
    let pipeline = Pipeline::new(config, producers, consumers)?;

    start_pipeline(pipeline).await
}

/// Starts a pipeline and cancels it on SIGINT or SIGTERM.
///
/// A cancelled run still completes its teardown and returns a summary flagged as cancelled.
#[tracing::instrument(skip(pipeline))]
async fn start_pipeline(mut pipeline: Pipeline) -> RunnerResult<RunSummary> {
    pipeline.start().await?;

    let shutdown_tx = pipeline.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        wait_for_termination_signal().await;
        shutdown_tx.shutdown();

        info!("shutdown signal sent to the pipeline");
    });

    let result = pipeline.wait().await;

    // The run may have finished on its own, in which case nobody waits for signals anymore.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    Ok(result?)
}

#[cfg(unix)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            warn!(error = %err, "failed to register sigterm handler, listening for ctrl+c only");
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = sigterm.recv() => {
            info!("sigterm received, shutting down pipeline");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("sigint (ctrl+c) received, shutting down pipeline"),
        Err(err) => {
            warn!(error = %err, "failed to listen for ctrl+c, the run cannot be interrupted");
            std::future::pending::<()>().await;
        }
    }
}
