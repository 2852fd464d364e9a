//! xcodebuild invocation construction and output scraping.
//!
//! Builds the archive and export-archive command lines from run options,
//! detects the installed Xcode version, and digs the IDEDistribution log
//! location out of failed export output.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use regex::Regex;

use super::command::CommandSpec;
use super::config::{CacheLevel, LogFormatter};
use super::runner::RunOpts;

/// Installed Xcode version, reduced to what the pipeline needs.
#[derive(Clone, Debug)]
pub struct XcodeVersion {
    /// Major version number
    pub major: u32,
    /// First line of `xcodebuild -version` for logging
    pub raw: String,
}

impl fmt::Display for XcodeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Resolves the toolchain version when the inputs do not pin one.
pub trait XcodeVersionProvider {
    /// Returns the installed Xcode version.
    fn version(&self) -> anyhow::Result<XcodeVersion>;
}

/// Production provider that shells out to `xcodebuild -version`.
#[derive(Clone, Copy, Debug, Default)]
pub struct XcodebuildVersionProvider;

impl XcodebuildVersionProvider {
    /// Creates a new version provider.
    pub fn new() -> Self {
        Self
    }
}

impl XcodeVersionProvider for XcodebuildVersionProvider {
    fn version(&self) -> anyhow::Result<XcodeVersion> {
        let xcodebuild = which::which("xcodebuild").context("xcodebuild not found in PATH")?;
        let output = std::process::Command::new(&xcodebuild)
            .arg("-version")
            .output()
            .context("running xcodebuild -version")?;
        anyhow::ensure!(
            output.status.success(),
            "xcodebuild -version exited with {}",
            output.status
        );
        parse_xcodebuild_version(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parses the major version out of `xcodebuild -version` output.
fn parse_xcodebuild_version(output: &str) -> anyhow::Result<XcodeVersion> {
    let line = output.lines().next().unwrap_or_default().trim();
    let pattern = Regex::new(r"^Xcode\s+(\d+)(?:\.\d+)*")?;
    let captures = pattern
        .captures(line)
        .with_context(|| format!("unexpected xcodebuild -version output: {line:?}"))?;
    let major = captures[1]
        .parse::<u32>()
        .context("parsing Xcode major version")?;
    Ok(XcodeVersion {
        major,
        raw: line.to_string(),
    })
}

/// Builds the archive invocation.
///
/// The clean action, when requested, runs as part of the same invocation
/// so it operates on the exact build settings the archive will use.
pub fn archive_command(
    opts: &RunOpts,
    archive_path: &Path,
    xcconfig_path: Option<&Path>,
) -> CommandSpec {
    let project_flag = if is_workspace(&opts.project_path) {
        "-workspace"
    } else {
        "-project"
    };

    let mut args = vec![
        project_flag.to_string(),
        opts.project_path.display().to_string(),
        "-scheme".to_string(),
        opts.scheme.clone(),
    ];

    if let Some(configuration) = &opts.configuration {
        args.push("-configuration".to_string());
        args.push(configuration.clone());
    }

    if opts.perform_clean_action {
        args.push("clean".to_string());
    }
    args.push("archive".to_string());
    args.push("-archivePath".to_string());
    args.push(archive_path.display().to_string());

    if let Some(xcconfig) = xcconfig_path {
        args.push("-xcconfig".to_string());
        args.push(xcconfig.display().to_string());
    }

    if opts.cache_level == CacheLevel::SwiftPackages {
        if let Some(cache_dir) = swift_packages_cache_dir() {
            args.push("-clonedSourcePackagesDirPath".to_string());
            args.push(cache_dir.display().to_string());
        }
    }

    args.extend(opts.additional_options.iter().cloned());

    CommandSpec::new("xcodebuild", args).pretty(opts.log_formatter == LogFormatter::Xcpretty)
}

/// Builds the export-archive invocation.
pub fn export_command(
    archive_path: &Path,
    export_dir: &Path,
    export_options_path: &Path,
    log_formatter: LogFormatter,
) -> CommandSpec {
    CommandSpec::new(
        "xcodebuild",
        [
            "-exportArchive".to_string(),
            "-archivePath".to_string(),
            archive_path.display().to_string(),
            "-exportPath".to_string(),
            export_dir.display().to_string(),
            "-exportOptionsPlist".to_string(),
            export_options_path.display().to_string(),
        ],
    )
    .pretty(log_formatter == LogFormatter::Xcpretty)
}

fn is_workspace(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("xcworkspace")
}

fn swift_packages_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("xcarchiver").join("swiftpm"))
}

/// Finds the IDEDistribution logs directory in failed export output.
///
/// On export failure xcodebuild logs a line like:
/// `IDEDistribution: -[IDEDistributionLogging _createLoggingBundleAtPath:]:
/// Writing "/var/folders/.../IDEDistribution.standard.log"` and the whole
/// parent directory is the diagnostic artifact worth publishing.
pub fn find_ide_distribution_logs_dir(transcript: &str) -> Option<PathBuf> {
    let pattern =
        Regex::new(r#"IDEDistribution: -\[IDEDistributionLogging [^\]]+\]: Writing "([^"]+)""#)
            .ok()?;
    let captures = pattern.captures(transcript)?;
    Path::new(captures.get(1)?.as_str())
        .parent()
        .map(Path::to_path_buf)
}
