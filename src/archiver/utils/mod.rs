//! Shared helpers for the archive pipeline.

pub mod fs;
