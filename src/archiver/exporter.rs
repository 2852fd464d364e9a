//! Artifact publication.
//!
//! Copies every artifact a run produced into the output directory. This
//! phase runs whether or not the run succeeded, so the invoking
//! environment always gets the diagnostics. Absent artifacts are skipped;
//! only filesystem failures are errors.

use std::path::{Path, PathBuf};

use super::config::Config;
use super::error::ExportError;
use super::runner::{Archive, RunResult};
use super::utils::fs::{copy_dir, copy_file};
use super::XcodebuildArchiver;

/// Options for artifact publication, snapshotted from [`Config`] and the
/// run's [`RunResult`].
#[derive(Clone, Debug, Default)]
pub struct ExportOpts {
    /// Directory artifacts are published to
    pub output_dir: PathBuf,
    /// Base name for published artifacts
    pub artifact_name: String,
    /// Publish every dSYM bundle found in the archive
    pub export_all_dsyms: bool,
    /// The built archive, if the build succeeded
    pub archive: Option<Archive>,
    /// Resolved export options passed to xcodebuild
    pub export_options_path: Option<PathBuf>,
    /// Directory holding the exported package(s)
    pub app_export_dir: Option<PathBuf>,
    /// Archive build log
    pub archive_log: Option<PathBuf>,
    /// Export-archive log
    pub export_archive_log: Option<PathBuf>,
    /// IDEDistribution diagnostics directory
    pub ide_distribution_logs_dir: Option<PathBuf>,
}

impl ExportOpts {
    /// Combines the configured output surface with whatever the run
    /// actually produced.
    pub fn from_run(config: &Config, result: &RunResult) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            artifact_name: result.artifact_name.clone(),
            export_all_dsyms: config.export_all_dsyms,
            archive: result.archive.clone(),
            export_options_path: result.export_options_path.clone(),
            app_export_dir: result.app_export_dir.clone(),
            archive_log: result.archive_log.clone(),
            export_archive_log: result.export_archive_log.clone(),
            ide_distribution_logs_dir: result.ide_distribution_logs_dir.clone(),
        }
    }
}

impl<E, C, V> XcodebuildArchiver<E, C, V> {
    /// Publishes every artifact present in the options.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] only on filesystem failures. A missing
    /// upstream artifact is a caller-level concern and never an error here.
    pub async fn export_output(&self, opts: ExportOpts) -> Result<(), ExportError> {
        tokio::fs::create_dir_all(&opts.output_dir)
            .await
            .map_err(|source| ExportError::OutputDir {
                path: opts.output_dir.clone(),
                source,
            })?;

        if let Some(archive) = &opts.archive {
            let dest = opts
                .output_dir
                .join(format!("{}.xcarchive", opts.artifact_name));
            publish_dir("archive", &archive.path, &dest).await?;

            if opts.export_all_dsyms {
                self.export_dsyms(archive, &opts.output_dir).await?;
            }
        } else {
            log::debug!("no archive produced, skipping");
        }

        if let Some(export_dir) = &opts.app_export_dir {
            self.export_packages(export_dir, &opts.output_dir).await?;
        } else {
            log::debug!("no exported package directory, skipping");
        }

        if let Some(path) = &opts.export_options_path {
            let dest = opts.output_dir.join("export_options.plist");
            publish_file("export options", path, &dest).await?;
        }

        if let Some(path) = &opts.archive_log {
            let dest = opts.output_dir.join("xcodebuild-archive.log");
            publish_file("archive log", path, &dest).await?;
        }

        if let Some(path) = &opts.export_archive_log {
            let dest = opts.output_dir.join("xcodebuild-export-archive.log");
            publish_file("export-archive log", path, &dest).await?;
        }

        if let Some(dir) = &opts.ide_distribution_logs_dir {
            let dest = opts.output_dir.join("ide-distribution-logs");
            publish_dir("IDEDistribution logs", dir, &dest).await?;
        }

        Ok(())
    }

    /// Copies each dSYM bundle found in the archive.
    async fn export_dsyms(&self, archive: &Archive, output_dir: &Path) -> Result<(), ExportError> {
        let dsyms_dir = archive.dsyms_dir();
        if !dsyms_dir.is_dir() {
            log::debug!("archive has no dSYMs directory, skipping");
            return Ok(());
        }

        let mut entries =
            tokio::fs::read_dir(&dsyms_dir)
                .await
                .map_err(|source| ExportError::ReadExportDir {
                    path: dsyms_dir.clone(),
                    source,
                })?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| ExportError::ReadExportDir {
                path: dsyms_dir.clone(),
                source,
            })?
        {
            let path = entry.path();
            let is_dsym = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".dSYM"));
            if !is_dsym {
                continue;
            }
            if let Some(name) = path.file_name() {
                publish_dir("dSYM bundle", &path, &output_dir.join(name)).await?;
            }
        }
        Ok(())
    }

    /// Copies the distributable package(s) out of the export directory.
    async fn export_packages(
        &self,
        export_dir: &Path,
        output_dir: &Path,
    ) -> Result<(), ExportError> {
        if !export_dir.is_dir() {
            log::debug!("export directory {} is absent, skipping", export_dir.display());
            return Ok(());
        }

        let mut entries =
            tokio::fs::read_dir(export_dir)
                .await
                .map_err(|source| ExportError::ReadExportDir {
                    path: export_dir.to_path_buf(),
                    source,
                })?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| ExportError::ReadExportDir {
                path: export_dir.to_path_buf(),
                source,
            })?
        {
            let path = entry.path();
            let is_package = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("ipa") | Some("pkg") | Some("app")
            );
            if !is_package {
                continue;
            }
            if let Some(name) = path.file_name() {
                let dest = output_dir.join(name);
                if path.is_dir() {
                    publish_dir("exported package", &path, &dest).await?;
                } else {
                    publish_file("exported package", &path, &dest).await?;
                }
            }
        }
        Ok(())
    }
}

async fn publish_file(artifact: &'static str, src: &Path, dest: &Path) -> Result<(), ExportError> {
    if !src.exists() {
        log::debug!("{artifact} at {} is absent, skipping", src.display());
        return Ok(());
    }
    copy_file(src, dest)
        .await
        .map_err(|source| ExportError::Publish {
            artifact,
            dest: dest.to_path_buf(),
            source,
        })?;
    log::info!("{artifact} published to {}", dest.display());
    Ok(())
}

async fn publish_dir(artifact: &'static str, src: &Path, dest: &Path) -> Result<(), ExportError> {
    if !src.is_dir() {
        log::debug!("{artifact} at {} is absent, skipping", src.display());
        return Ok(());
    }
    copy_dir(src, dest)
        .await
        .map_err(|source| ExportError::Publish {
            artifact,
            dest: dest.to_path_buf(),
            source,
        })?;
    log::info!("{artifact} published to {}", dest.display());
    Ok(())
}
