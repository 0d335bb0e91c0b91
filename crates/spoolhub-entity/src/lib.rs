//! Domain entities for SpoolHub.

pub mod job;

pub use job::{JobStatus, PaperSize, PrintJob, PrintSettings};
