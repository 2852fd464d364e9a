//! Validated build configuration.
//!
//! [`Config`] is produced once by input processing and read-only afterward,
//! with a single exception: the orchestrator may downgrade
//! [`Config::log_formatter`] to [`LogFormatter::Xcodebuild`] when installing
//! the pretty formatter fails.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How xcodebuild output is rendered while it is captured.
///
/// The formatter only changes rendering; the underlying xcodebuild
/// invocation is identical either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatter {
    /// Raw xcodebuild output
    Xcodebuild,
    /// Pretty-printed summaries via the xcpretty tool
    Xcpretty,
}

impl FromStr for LogFormatter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xcodebuild" => Ok(Self::Xcodebuild),
            "xcpretty" => Ok(Self::Xcpretty),
            _ => Err("expected `xcodebuild` or `xcpretty`".into()),
        }
    }
}

impl fmt::Display for LogFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xcodebuild => write!(f, "xcodebuild"),
            Self::Xcpretty => write!(f, "xcpretty"),
        }
    }
}

/// Distribution method written into the generated export options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportMethod {
    /// Development distribution (default)
    Development,
    /// App Store Connect upload
    AppStore,
    /// Ad-hoc distribution to registered devices
    AdHoc,
    /// In-house enterprise distribution
    Enterprise,
}

impl FromStr for ExportMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "app-store" => Ok(Self::AppStore),
            "ad-hoc" => Ok(Self::AdHoc),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err("expected one of `development`, `app-store`, `ad-hoc`, `enterprise`".into()),
        }
    }
}

impl fmt::Display for ExportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::AppStore => write!(f, "app-store"),
            Self::AdHoc => write!(f, "ad-hoc"),
            Self::Enterprise => write!(f, "enterprise"),
        }
    }
}

/// Dependency cache policy for the archive build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheLevel {
    /// No caching directives are passed to xcodebuild
    None,
    /// Resolved Swift packages are cloned into a persistent cache directory
    SwiftPackages,
}

impl FromStr for CacheLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "swift_packages" => Ok(Self::SwiftPackages),
            _ => Err("expected `none` or `swift_packages`".into()),
        }
    }
}

/// Automatic code signing strategy handed to the code-signing manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodesignStrategy {
    /// App Store Connect API key authentication
    ApiKey,
    /// Apple ID session authentication
    AppleId,
}

impl fmt::Display for CodesignStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey => write!(f, "api-key"),
            Self::AppleId => write!(f, "apple-id"),
        }
    }
}

/// Inputs for the code-signing manager collaborator.
///
/// The manager itself is opaque to the pipeline; these options are carried
/// through [`Config`] and handed over untouched.
#[derive(Clone, Debug)]
pub struct CodesignOpts {
    /// Authentication strategy for signing asset management
    pub strategy: CodesignStrategy,
    /// Development team the signing assets must belong to
    pub development_team: Option<String>,
}

/// Validated, internally consistent build parameters.
#[derive(Clone, Debug)]
pub struct Config {
    /// Absolute path to the .xcodeproj or .xcworkspace
    pub project_path: PathBuf,

    /// Scheme to archive
    pub scheme: String,

    /// Build configuration override; scheme default when None
    pub configuration: Option<String>,

    /// Output rendering mode.
    ///
    /// The only field the orchestrator may mutate after input processing:
    /// it falls back to [`LogFormatter::Xcodebuild`] when the pretty
    /// formatter cannot be installed.
    pub log_formatter: LogFormatter,

    /// Effective Xcode major version (pinned or detected)
    pub xcode_major_version: u32,

    /// Base name for exported artifacts
    pub artifact_name: String,

    /// Code signing options; None leaves signing entirely to the project
    pub codesign: Option<CodesignOpts>,

    /// Run the clean action before archiving
    pub perform_clean_action: bool,

    /// Build settings override written to a scratch .xcconfig file
    pub xcconfig_content: Option<String>,

    /// Additional options appended to the archive invocation
    pub additional_options: Vec<String>,

    /// Dependency cache policy
    pub cache_level: CacheLevel,

    /// Caller-supplied export options; when set, the individual export
    /// inputs below are ignored
    pub custom_export_options_content: Option<String>,

    /// Distribution method for the generated export options
    pub export_method: ExportMethod,

    /// iCloud container environment for non-app-store exports
    pub icloud_container_environment: Option<String>,

    /// Development team for the generated export options
    pub export_development_team: Option<String>,

    /// Include bitcode in App Store exports
    pub upload_bitcode: bool,

    /// Recompile from bitcode in non-app-store exports
    pub compile_bitcode: bool,

    /// Absolute path artifacts are published to
    pub output_dir: PathBuf,

    /// Publish every dSYM bundle found in the archive
    pub export_all_dsyms: bool,
}
