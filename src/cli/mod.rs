//! Command line interface for the archive step.
//!
//! Parses the input surface, wires up the production collaborators
//! (shell command executor, environment-backed code-signing manager,
//! xcodebuild version provider), and hands off to the pipeline.

mod args;

pub use args::Args;

use crate::archiver::{
    self, EnvCodesignManager, ShellExecutor, XcodebuildArchiver, XcodebuildVersionProvider,
};
use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();

    let archiver = XcodebuildArchiver::new(
        ShellExecutor::new(),
        EnvCodesignManager::new(),
        XcodebuildVersionProvider::new(),
    );

    Ok(archiver::run_pipeline(&archiver, args.into()).await)
}
