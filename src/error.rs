//! Top-level error types for the archive step.
//!
//! Each pipeline phase has its own error enum under [`crate::archiver`];
//! this module wraps them with the phase context the orchestrator reports.

use thiserror::Error;

use crate::archiver::{ConfigError, DependencyError, ExportError, RunError};

/// Result type alias for step operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the whole pipeline, tagged by the phase that failed
#[derive(Error, Debug)]
pub enum Error {
    /// Input processing failed; nothing was built or exported
    #[error("failed to process inputs: {0}")]
    Config(#[from] ConfigError),

    /// A load-bearing dependency could not be ensured
    #[error("failed to install dependencies: {0}")]
    Dependency(#[from] DependencyError),

    /// The archive/export run failed; partial artifacts may still exist
    #[error("failed to execute archive run: {0}")]
    Run(#[from] RunError),

    /// Publishing artifacts to the output directory failed
    #[error("failed to export outputs: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}
