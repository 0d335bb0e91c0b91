//! Print job domain entities.

pub mod model;
pub mod settings;
pub mod status;

pub use model::PrintJob;
pub use settings::{PaperSize, PrintSettings};
pub use status::JobStatus;
