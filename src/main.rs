//! SpoolHub Server: a print spooler with preview and confirmation.
//!
//! Opens the job store and virtual printer, then drives the print pipeline
//! until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing_subscriber::{EnvFilter, fmt};

use spoolhub_core::config::AppConfig;
use spoolhub_core::error::{AppError, ErrorKind};
use spoolhub_printer::{PageAccepted, VirtualPrinter};
use spoolhub_render::SimpleTextRenderer;
use spoolhub_spooler::JobStore;
use spoolhub_worker::{SpoolerWorker, WorkerRunner};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `SPOOLHUB_CONFIG`, or from `config/` for `SPOOLHUB_ENV`
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var_os("SPOOLHUB_CONFIG") {
        Some(path) => AppConfig::load_from(&PathBuf::from(path)),
        None => {
            let env = std::env::var("SPOOLHUB_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting SpoolHub v{}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&config.output.root)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create output directory '{}'", config.output.root),
                e,
            )
        })?;

    let store = Arc::new(JobStore::from_config(&config.spool).await?);
    let printer = Arc::new(VirtualPrinter::from_config(&config.output));
    let renderer = Arc::new(SimpleTextRenderer::new(&config.render));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let preview_handle = tokio::spawn(log_previews(printer.subscribe(), shutdown_rx.clone()));

    let worker_handle = if config.worker.enabled {
        let worker = Arc::new(SpoolerWorker::new(
            Arc::clone(&store),
            Arc::clone(&printer),
            renderer,
        ));
        let runner = WorkerRunner::new(worker, &config.worker);
        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(worker_cancel).await;
        });
        tracing::info!("Background worker started");
        Some(handle)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    tracing::info!(
        spool = %store.root().display(),
        output = %printer.output_root().display(),
        jobs = store.list_jobs().len(),
        "SpoolHub ready"
    );

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping...");
    let _ = shutdown_tx.send(true);

    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(30), handle).await;
    }
    let _ = preview_handle.await;

    tracing::info!("SpoolHub shut down gracefully");
    Ok(())
}

/// Report each persisted page as it arrives
async fn log_previews(
    mut pages: broadcast::Receiver<PageAccepted>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            received = pages.recv() => match received {
                Ok(page) => {
                    let (width, height) = page.image.dimensions();
                    tracing::info!(
                        job_id = %page.job.id,
                        document = %page.job.document_name,
                        page = page.page_number,
                        width,
                        height,
                        "Preview page ready"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Preview listener fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
