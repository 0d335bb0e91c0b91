//! Page sources, pagination, and page rasterization for SpoolHub.
//!
//! This crate provides:
//! - [`PageSource`] implementations that supply raw document content
//! - The text layout engine (word wrap and pagination)
//! - [`PageRenderer`] implementations that rasterize one page at a time
//!
//! Nothing in here knows about jobs, queues, or persistence.

pub mod glyph;
pub mod layout;
pub mod renderer;
pub mod source;

pub use layout::{PageGeometry, Pagination, TextMetrics};
pub use renderer::{PageRenderer, SimpleTextRenderer};
pub use source::{ContentType, ImagePageSource, PageSource, TextPageSource, open_source};
