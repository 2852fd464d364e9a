//! The archive/export run.
//!
//! Orchestrates code-signing preparation, the archive build, and the
//! export-archive step, capturing xcodebuild output to log artifacts on
//! every path. The accumulated [`RunResult`] travels back even when a step
//! fails: the caller needs the partial artifacts for diagnostics export.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::command::{CommandExecutor, CommandSpec};
use super::config::{CacheLevel, CodesignOpts, Config, ExportMethod, LogFormatter};
use super::error::RunError;
use super::signing::CodesignManager;
use super::{export_options, xcodebuild, XcodebuildArchiver};

/// Options for a single archive/export run, snapshotted from [`Config`].
#[derive(Clone, Debug)]
pub struct RunOpts {
    /// Absolute path to the .xcodeproj or .xcworkspace
    pub project_path: PathBuf,
    /// Scheme to archive
    pub scheme: String,
    /// Build configuration override
    pub configuration: Option<String>,
    /// Output rendering mode
    pub log_formatter: LogFormatter,
    /// Effective Xcode major version
    pub xcode_major_version: u32,
    /// Base name for produced artifacts
    pub artifact_name: String,
    /// Code signing options; None skips signing preparation
    pub codesign: Option<CodesignOpts>,
    /// Run the clean action before archiving
    pub perform_clean_action: bool,
    /// Build settings override content
    pub xcconfig_content: Option<String>,
    /// Additional options for the archive invocation
    pub additional_options: Vec<String>,
    /// Dependency cache policy
    pub cache_level: CacheLevel,
    /// Caller-supplied export options payload
    pub custom_export_options_content: Option<String>,
    /// Distribution method for generated export options
    pub export_method: ExportMethod,
    /// iCloud container environment for non-app-store exports
    pub icloud_container_environment: Option<String>,
    /// Development team for generated export options
    pub export_development_team: Option<String>,
    /// Include bitcode in App Store exports
    pub upload_bitcode: bool,
    /// Recompile from bitcode in other exports
    pub compile_bitcode: bool,
}

impl RunOpts {
    /// Snapshots the run-relevant slice of a [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self {
            project_path: config.project_path.clone(),
            scheme: config.scheme.clone(),
            configuration: config.configuration.clone(),
            log_formatter: config.log_formatter,
            xcode_major_version: config.xcode_major_version,
            artifact_name: config.artifact_name.clone(),
            codesign: config.codesign.clone(),
            perform_clean_action: config.perform_clean_action,
            xcconfig_content: config.xcconfig_content.clone(),
            additional_options: config.additional_options.clone(),
            cache_level: config.cache_level,
            custom_export_options_content: config.custom_export_options_content.clone(),
            export_method: config.export_method,
            icloud_container_environment: config.icloud_container_environment.clone(),
            export_development_team: config.export_development_team.clone(),
            upload_bitcode: config.upload_bitcode,
            compile_bitcode: config.compile_bitcode,
        }
    }
}

/// Handle to a produced .xcarchive.
#[derive(Clone, Debug)]
pub struct Archive {
    /// Path to the archive bundle
    pub path: PathBuf,
}

impl Archive {
    /// Directory holding the archive's dSYM bundles.
    pub fn dsyms_dir(&self) -> PathBuf {
        self.path.join("dSYMs")
    }
}

/// Everything a run produced, populated incrementally.
///
/// Fields are independent: a log path may be present while the archive is
/// absent. The result owns the run's scratch directory, so partial
/// artifacts stay on disk until the result is dropped after output export.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Base name for produced artifacts
    pub artifact_name: String,
    /// The built archive, when the build succeeded
    pub archive: Option<Archive>,
    /// Resolved export options actually passed to xcodebuild
    pub export_options_path: Option<PathBuf>,
    /// Directory the distributable package was exported to
    pub app_export_dir: Option<PathBuf>,
    /// Captured output of the archive build
    pub archive_log: Option<PathBuf>,
    /// Captured output of the export-archive step
    pub export_archive_log: Option<PathBuf>,
    /// IDEDistribution diagnostics directory from a failed export
    pub ide_distribution_logs_dir: Option<PathBuf>,

    // Keeps the scratch directory alive until the result is dropped
    workdir: Option<TempDir>,
}

impl RunResult {
    /// Creates an empty result for the given artifact name.
    pub fn new(artifact_name: impl Into<String>) -> Self {
        Self {
            artifact_name: artifact_name.into(),
            ..Default::default()
        }
    }
}

impl<E: CommandExecutor, C: CodesignManager, V> XcodebuildArchiver<E, C, V> {
    /// Runs the archive and export steps.
    ///
    /// Returns the accumulated [`RunResult`] together with the error that
    /// stopped the run, if any. The result is never empty on failure: log
    /// artifacts recorded before the failure point are kept so the caller
    /// can publish them.
    pub async fn run(&self, opts: RunOpts) -> (RunResult, Option<RunError>) {
        let mut result = RunResult::new(opts.artifact_name.clone());
        let error = self.run_steps(&opts, &mut result).await.err();
        if let Some(e) = &error {
            log::error!("archive run failed: {e}");
        }
        (result, error)
    }

    async fn run_steps(&self, opts: &RunOpts, result: &mut RunResult) -> Result<(), RunError> {
        log::info!(
            "archiving scheme {} with the Xcode {} toolchain",
            opts.scheme,
            opts.xcode_major_version
        );

        let workdir = tempfile::Builder::new()
            .prefix("xcarchiver")
            .tempdir()
            .map_err(|source| RunError::Io {
                context: "creating run scratch directory".to_string(),
                source,
            })?;
        let work = workdir.path().to_path_buf();
        result.workdir = Some(workdir);

        // Signing context lives until this function returns, so teardown
        // runs whether the steps below succeed or bail out early.
        let _signing = match &opts.codesign {
            Some(codesign) => Some(
                self.codesign
                    .prepare(codesign)
                    .map_err(RunError::Codesign)?,
            ),
            None => None,
        };

        let xcconfig_path = match &opts.xcconfig_content {
            Some(content) => {
                let path = work.join("build.xcconfig");
                tokio::fs::write(&path, content)
                    .await
                    .map_err(|source| RunError::Io {
                        context: "writing xcconfig override".to_string(),
                        source,
                    })?;
                Some(path)
            }
            None => None,
        };

        // Archive build; the log artifact is written no matter how it exits
        let archive_path = work.join(format!("{}.xcarchive", opts.artifact_name));
        let spec = xcodebuild::archive_command(opts, &archive_path, xcconfig_path.as_deref());
        let output = self.run_command(&spec).await?;
        let archive_log = work.join("xcodebuild-archive.log");
        write_log(&archive_log, &output.transcript).await?;
        result.archive_log = Some(archive_log);
        if !output.success() {
            return Err(RunError::Build {
                code: output.exit_code,
            });
        }
        result.archive = Some(Archive {
            path: archive_path.clone(),
        });
        log::info!("archive created at {}", archive_path.display());

        // Export options: caller-supplied payload wins over the generated one
        let export_options_path = work.join("export_options.plist");
        match &opts.custom_export_options_content {
            Some(content) => {
                tokio::fs::write(&export_options_path, content)
                    .await
                    .map_err(|source| RunError::Io {
                        context: "writing custom export options".to_string(),
                        source,
                    })?;
            }
            None => {
                export_options::write(&export_options_path, &export_options::for_run(opts))?;
            }
        }
        result.export_options_path = Some(export_options_path.clone());

        let export_dir = work.join("export");
        let spec = xcodebuild::export_command(
            &archive_path,
            &export_dir,
            &export_options_path,
            opts.log_formatter,
        );
        let output = self.run_command(&spec).await?;
        let export_log = work.join("xcodebuild-export-archive.log");
        write_log(&export_log, &output.transcript).await?;
        result.export_archive_log = Some(export_log);
        if !output.success() {
            if let Some(dir) = xcodebuild::find_ide_distribution_logs_dir(&output.transcript) {
                log::info!("IDEDistribution logs found at {}", dir.display());
                result.ide_distribution_logs_dir = Some(dir);
            }
            return Err(RunError::ExportArchive {
                code: output.exit_code,
            });
        }
        result.app_export_dir = Some(export_dir);

        Ok(())
    }

    async fn run_command(
        &self,
        spec: &CommandSpec,
    ) -> Result<super::command::CommandOutput, RunError> {
        self.executor
            .run(spec)
            .await
            .map_err(|e| RunError::Command {
                command: e.program.clone(),
                source: e.source,
            })
    }
}

async fn write_log(path: &Path, transcript: &str) -> Result<(), RunError> {
    tokio::fs::write(path, transcript)
        .await
        .map_err(|source| RunError::Io {
            context: format!("writing log {}", path.display()),
            source,
        })?;
    log::info!("log saved to {}", path.display());
    Ok(())
}
