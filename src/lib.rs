//! Xcode archive-and-export build step library.
//!
//! This library provides the orchestration layer around the `xcodebuild`
//! toolchain for producing a build archive and a distributable package:
//! - input validation and normalization into a typed [`archiver::Config`]
//! - dependency checks with graceful degradation of the log formatter
//! - the archive/export run with code-signing setup and log capture
//! - artifact publication that runs whether or not the build succeeded
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod archiver;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{Error, Result};
