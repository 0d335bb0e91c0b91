//! Virtual printer for SpoolHub.
//!
//! Persists rendered pages as PNG files, notifies live subscribers as each
//! page lands, and compiles a job's pages into a single PDF on commit.

pub mod event;
pub mod pdf;
pub mod printer;

pub use event::PageAccepted;
pub use printer::{FinalizeOutcome, VirtualPrinter};
