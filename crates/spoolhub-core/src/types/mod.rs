//! Core type definitions used across the SpoolHub workspace.

pub mod id;

pub use id::JobId;
