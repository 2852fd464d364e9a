//! Error types for the archive pipeline phases.
//!
//! Each phase owns a dedicated enum so the orchestrator can branch on the
//! kind of failure type-safely: configuration and output-export failures
//! abort the pipeline, a formatter install failure is absorbed by
//! downgrading the formatter, and run failures still flow into the
//! output-export phase so diagnostics get published.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Input processing errors. Always fatal; nothing is built or exported.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required input was left empty
    #[error("required input `{name}` is missing")]
    MissingInput {
        /// Input name as it appears on the CLI
        name: &'static str,
    },

    /// An input value failed to parse or is out of range
    #[error("invalid value `{value}` for input `{name}`: {reason}")]
    InvalidInput {
        /// Input name as it appears on the CLI
        name: &'static str,
        /// The rejected value
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The project path does not point at anything
    #[error("project path {path:?} does not exist")]
    ProjectNotFound {
        /// The resolved project path
        path: PathBuf,
    },

    /// The project path is not an Xcode project or workspace
    #[error("project path {path:?} is not an .xcodeproj or .xcworkspace")]
    UnsupportedProjectType {
        /// The resolved project path
        path: PathBuf,
    },

    /// `-xcconfig` passed both as an additional option and as override content
    #[error(
        "`-xcconfig` cannot be used in the additional xcodebuild options while an xcconfig override is also set"
    )]
    ConflictingXcconfig,

    /// A relative input path could not be resolved
    #[error("failed to resolve path {path:?}: {source}")]
    PathResolve {
        /// The path that failed to resolve
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },

    /// The Xcode version could not be determined
    #[error("failed to determine Xcode version: {0}")]
    XcodeVersion(String),

    /// The detected or pinned Xcode is older than the step supports
    #[error("Xcode {major} is not supported, Xcode {min} or newer is required")]
    UnsupportedXcodeVersion {
        /// The detected or pinned major version
        major: u32,
        /// Minimum supported major version
        min: u32,
    },
}

/// Dependency preparation errors.
///
/// [`DependencyError::FormatterInstall`] is the single recoverable kind:
/// the orchestrator downgrades the log formatter and continues. Everything
/// else aborts the pipeline before any build is attempted.
#[derive(Error, Debug)]
pub enum DependencyError {
    /// The xcodebuild toolchain itself is missing or broken
    #[error("xcodebuild is not available: {reason}")]
    MissingToolchain {
        /// Why the toolchain probe failed
        reason: String,
    },

    /// Installing the xcpretty log formatter failed
    #[error("installing xcpretty failed: {reason}")]
    FormatterInstall {
        /// Why the install failed
        reason: String,
    },
}

impl DependencyError {
    /// Check if this error is recoverable by degrading the log formatter.
    ///
    /// The pretty formatter is a cosmetic convenience; losing it must not
    /// fail the build. Future optional dependencies get their own variant
    /// and an arm here.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::FormatterInstall { .. })
    }
}

/// Archive/export run errors.
///
/// A run error never empties the accumulated [`super::RunResult`]; the
/// partial result travels back with the error so the log artifacts
/// produced up to the failure point can still be published.
#[derive(Error, Debug)]
pub enum RunError {
    /// Code signing preparation failed before any build was attempted
    #[error("code signing preparation failed: {0}")]
    Codesign(#[source] anyhow::Error),

    /// The archive build command exited with a failure
    #[error("xcodebuild archive exited with code {code:?}")]
    Build {
        /// Exit code of the archive command, if it exited at all
        code: Option<i32>,
    },

    /// The export-archive command exited with a failure
    #[error("xcodebuild -exportArchive exited with code {code:?}")]
    ExportArchive {
        /// Exit code of the export command, if it exited at all
        code: Option<i32>,
    },

    /// An external command could not be launched
    #[error("failed to launch `{command}`: {source}")]
    Command {
        /// The command that failed to launch
        command: String,
        /// Underlying IO error
        source: io::Error,
    },

    /// Writing the generated export options failed
    #[error("failed to write export options: {0}")]
    ExportOptions(#[from] plist::Error),

    /// Scratch file or log IO failed
    #[error("{context}: {source}")]
    Io {
        /// What was being written or created
        context: String,
        /// Underlying IO error
        source: io::Error,
    },
}

/// Artifact publication errors. Always fatal, reported last.
///
/// Missing artifacts are never an error here; only filesystem failures are.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The output directory could not be created
    #[error("failed to create output directory {path:?}: {source}")]
    OutputDir {
        /// The configured output directory
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },

    /// Copying an artifact into the output directory failed
    #[error("failed to publish {artifact} to {dest:?}: {source}")]
    Publish {
        /// Which artifact was being published
        artifact: &'static str,
        /// Destination path of the failed copy
        dest: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },

    /// The export directory produced by the run could not be listed
    #[error("failed to read export directory {path:?}: {source}")]
    ReadExportDir {
        /// The export directory
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },
}
