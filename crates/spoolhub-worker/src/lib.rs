//! Print pipeline and background worker for SpoolHub.
//!
//! This crate provides:
//! - [`SpoolerWorker`], which advances one job by one stage per step
//! - [`WorkerRunner`], the polling loop that drives it until shutdown

pub mod pipeline;
pub mod runner;

pub use pipeline::SpoolerWorker;
pub use runner::WorkerRunner;
