//! Xcode archive pipeline orchestration.
//!
//! # Overview
//!
//! The pipeline runs four strictly ordered phases:
//! 1. Input processing validates raw inputs into a typed [`Config`]
//! 2. Dependency preparation verifies the toolchain and, when asked for,
//!    the pretty log formatter
//! 3. The archive/export run produces the archive, the distributable
//!    package, and log artifacts
//! 4. Output export publishes whatever exists to the output directory
//!
//! Phase failures are isolated: a formatter install failure degrades the
//! formatter and continues, a run failure is remembered but output export
//! still happens, and only input processing, fatal dependency failures,
//! and output export abort the pipeline outright.
//!
//! # Module Organization
//!
//! - [`command`] - external command execution and output capture
//! - [`config`] - validated build configuration
//! - [`dependencies`] - toolchain and formatter preparation
//! - [`error`] - per-phase error enums
//! - [`export_options`] - export options plist generation
//! - [`exporter`] - artifact publication
//! - [`inputs`] - raw input validation and normalization
//! - [`runner`] - the archive/export run
//! - [`signing`] - code signing managers and scoped contexts
//! - [`xcodebuild`] - xcodebuild invocation construction and scraping

mod command;
mod config;
mod dependencies;
mod error;
mod export_options;
mod exporter;
mod inputs;
mod runner;
mod signing;
mod utils;
mod xcodebuild;

pub use command::{CommandExecutor, CommandOutput, CommandSpec, ShellExecutor, SpawnError};
pub use config::{
    CacheLevel, CodesignOpts, CodesignStrategy, Config, ExportMethod, LogFormatter,
};
pub use dependencies::EnsureDependenciesOpts;
pub use error::{ConfigError, DependencyError, ExportError, RunError};
pub use exporter::ExportOpts;
pub use inputs::RawInputs;
pub use runner::{Archive, RunOpts, RunResult};
pub use signing::{CodesignManager, EnvCodesignManager, SigningContext, TempKeychain};
pub use xcodebuild::{XcodeVersion, XcodeVersionProvider, XcodebuildVersionProvider};

use crate::error::Error;

/// The archive pipeline with its injected collaborators.
///
/// Generic over the command executor, the code-signing manager, and the
/// Xcode version provider so the phases stay testable without a toolchain.
pub struct XcodebuildArchiver<E, C, V> {
    executor: E,
    codesign: C,
    xcode_version_provider: V,
}

impl<E, C, V> XcodebuildArchiver<E, C, V> {
    /// Creates an archiver from its collaborators.
    pub fn new(executor: E, codesign: C, xcode_version_provider: V) -> Self {
        Self {
            executor,
            codesign,
            xcode_version_provider,
        }
    }
}

/// Runs the whole pipeline and returns the process exit code.
///
/// Exit code 0 means the archive and export succeeded and every artifact
/// was published. Exit code 1 covers invalid inputs, a fatal dependency
/// failure, a failed run (whose logs are still published first), and a
/// failed output export.
pub async fn run_pipeline<E, C, V>(
    archiver: &XcodebuildArchiver<E, C, V>,
    inputs: RawInputs,
) -> i32
where
    E: CommandExecutor,
    C: CodesignManager,
    V: XcodeVersionProvider,
{
    let mut config = match archiver.process_inputs(inputs) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", Error::Config(e));
            return 1;
        }
    };

    let dependencies_opts = EnsureDependenciesOpts {
        xcpretty: config.log_formatter == LogFormatter::Xcpretty,
    };
    if let Err(e) = archiver.ensure_dependencies(&dependencies_opts).await {
        if e.is_recoverable() {
            log::warn!("{e}");
            log::warn!("switching to the xcodebuild log formatter");
            config.log_formatter = LogFormatter::Xcodebuild;
        } else {
            log::error!("{}", Error::Dependency(e));
            return 1;
        }
    }

    let mut exit_code = 0;
    let run_opts = RunOpts::from_config(&config);
    let (result, run_error) = archiver.run(run_opts).await;
    if let Some(e) = run_error {
        log::error!("{}", Error::Run(e));
        // Outputs are still exported below; the logs are the diagnostics
        exit_code = 1;
    }

    let export_opts = ExportOpts::from_run(&config, &result);
    if let Err(e) = archiver.export_output(export_opts).await {
        log::error!("{}", Error::Export(e));
        return 1;
    }

    exit_code
}
