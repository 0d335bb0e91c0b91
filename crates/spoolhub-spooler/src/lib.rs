//! Durable, concurrent job store for SpoolHub.
//!
//! The [`JobStore`] owns every job: an in-memory index for readers and one
//! JSON record per job on disk. All mutations go through it. The records
//! are authoritative; several processes may open the same spool root.

pub mod lock;
pub mod record;
pub mod store;

pub use store::JobStore;
