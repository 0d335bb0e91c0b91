//! Pipeline execution from the command line.

use clap::Args;
use tokio::sync::watch;

use spoolhub_core::error::{AppError, ErrorKind};

use crate::context::Context;
use crate::output;

/// Arguments for `work`
#[derive(Debug, Args)]
pub struct WorkArgs {
    /// Keep polling for new jobs until interrupted
    #[arg(short, long)]
    pub watch: bool,
}

/// Process available jobs, or keep running with `--watch`
pub async fn execute(args: &WorkArgs, ctx: &Context) -> Result<(), AppError> {
    let runner = ctx.runner();

    if !args.watch {
        let steps = runner.run_until_idle().await;
        output::print_success(&format!("Processed {steps} step(s)"));
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, "Failed to listen for Ctrl-C", e)
    })?;
    let _ = shutdown_tx.send(true);
    handle
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Worker task failed", e))?;

    output::print_success("Worker stopped");
    Ok(())
}
