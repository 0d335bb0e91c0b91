//! Shared wiring for commands: configuration, store, printer, worker.

use std::path::Path;
use std::sync::Arc;

use spoolhub_core::config::AppConfig;
use spoolhub_core::result::AppResult;
use spoolhub_printer::VirtualPrinter;
use spoolhub_render::SimpleTextRenderer;
use spoolhub_spooler::JobStore;
use spoolhub_worker::{SpoolerWorker, WorkerRunner};

/// Load configuration from an explicit file, or from `config/` for `env`.
pub fn load_config(path: Option<&Path>, env: &str) -> AppResult<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(env),
    }
}

/// Everything a command needs, opened once per invocation.
#[derive(Debug)]
pub struct Context {
    pub config: AppConfig,
    pub store: Arc<JobStore>,
    pub printer: Arc<VirtualPrinter>,
}

impl Context {
    pub async fn open(config: AppConfig) -> AppResult<Self> {
        let store = Arc::new(JobStore::from_config(&config.spool).await?);
        let printer = Arc::new(VirtualPrinter::from_config(&config.output));
        Ok(Self {
            config,
            store,
            printer,
        })
    }

    /// A runner over this context's store and printer.
    pub fn runner(&self) -> WorkerRunner {
        let worker = SpoolerWorker::new(
            Arc::clone(&self.store),
            Arc::clone(&self.printer),
            Arc::new(SimpleTextRenderer::new(&self.config.render)),
        );
        WorkerRunner::new(Arc::new(worker), &self.config.worker)
    }
}
