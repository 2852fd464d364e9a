//! Command line argument parsing.
//!
//! Every input is a long flag with an `XCARCHIVER_*` environment fallback,
//! so the step can be driven either interactively or from a CI environment.

use clap::Parser;
use std::path::PathBuf;

use crate::archiver::RawInputs;

/// Xcode archive-and-export build step
#[derive(Parser, Debug)]
#[command(
    name = "xcarchiver",
    version,
    about = "Archives an Xcode project and exports a distributable package",
    long_about = "Runs `xcodebuild archive` followed by `xcodebuild -exportArchive` and publishes
every artifact that was produced (archive, package, export options, build logs)
to the output directory.

Logs are published even when the build fails, so the invoking environment
always has the diagnostics.

Usage:
  xcarchiver --project-path ./App.xcodeproj --scheme App --output-dir ./deploy
  xcarchiver --project-path ./App.xcworkspace --scheme App \\
      --distribution-method app-store --export-development-team ABCDE12345 \\
      --output-dir ./deploy

Exit code 0 = archive and export succeeded and all artifacts were published."
)]
pub struct Args {
    /// Path to the .xcodeproj or .xcworkspace to archive
    #[arg(long, env = "XCARCHIVER_PROJECT_PATH", value_name = "PATH")]
    pub project_path: PathBuf,

    /// Scheme to archive
    #[arg(short, long, env = "XCARCHIVER_SCHEME", value_name = "SCHEME")]
    pub scheme: String,

    /// Build configuration (scheme default when omitted)
    #[arg(long, env = "XCARCHIVER_CONFIGURATION", value_name = "NAME")]
    pub configuration: Option<String>,

    /// Log formatter: xcodebuild (raw) or xcpretty
    #[arg(
        long,
        env = "XCARCHIVER_LOG_FORMATTER",
        default_value = "xcodebuild",
        value_name = "FORMATTER"
    )]
    pub log_formatter: String,

    /// Pin the Xcode major version instead of auto-detecting it
    #[arg(long, env = "XCARCHIVER_XCODE_MAJOR_VERSION", value_name = "VERSION")]
    pub xcode_major_version: Option<u32>,

    /// Base name for exported artifacts (defaults to the scheme)
    #[arg(long, env = "XCARCHIVER_ARTIFACT_NAME", value_name = "NAME")]
    pub artifact_name: Option<String>,

    /// Automatic code signing strategy: off, api-key, or apple-id
    #[arg(
        long,
        env = "XCARCHIVER_AUTOMATIC_CODE_SIGNING",
        default_value = "off",
        value_name = "STRATEGY"
    )]
    pub automatic_code_signing: String,

    /// Run the clean action before archiving
    #[arg(long = "clean", env = "XCARCHIVER_CLEAN")]
    pub perform_clean_action: bool,

    /// Build settings override, passed to xcodebuild as an .xcconfig file
    #[arg(long, env = "XCARCHIVER_XCCONFIG_CONTENT", value_name = "CONTENT")]
    pub xcconfig_content: Option<String>,

    /// Additional xcodebuild options, whitespace separated
    #[arg(
        long,
        env = "XCARCHIVER_XCODEBUILD_OPTIONS",
        default_value = "",
        value_name = "OPTIONS"
    )]
    pub xcodebuild_options: String,

    /// Dependency cache policy: none or swift_packages
    #[arg(
        long,
        env = "XCARCHIVER_CACHE_LEVEL",
        default_value = "swift_packages",
        value_name = "LEVEL"
    )]
    pub cache_level: String,

    /// Full export options plist content; overrides the generated one
    #[arg(
        long,
        env = "XCARCHIVER_EXPORT_OPTIONS_PLIST_CONTENT",
        value_name = "CONTENT"
    )]
    pub export_options_plist_content: Option<String>,

    /// Distribution method: development, app-store, ad-hoc, or enterprise
    #[arg(
        long,
        env = "XCARCHIVER_DISTRIBUTION_METHOD",
        default_value = "development",
        value_name = "METHOD"
    )]
    pub distribution_method: String,

    /// iCloud container environment for non-app-store exports
    #[arg(
        long,
        env = "XCARCHIVER_ICLOUD_CONTAINER_ENVIRONMENT",
        value_name = "ENVIRONMENT"
    )]
    pub icloud_container_environment: Option<String>,

    /// Development team to use in the generated export options
    #[arg(long, env = "XCARCHIVER_EXPORT_DEVELOPMENT_TEAM", value_name = "TEAM")]
    pub export_development_team: Option<String>,

    /// Include bitcode when exporting for the App Store
    #[arg(
        long,
        env = "XCARCHIVER_UPLOAD_BITCODE",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_name = "BOOL"
    )]
    pub upload_bitcode: bool,

    /// Recompile from bitcode for non-app-store exports
    #[arg(
        long,
        env = "XCARCHIVER_COMPILE_BITCODE",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_name = "BOOL"
    )]
    pub compile_bitcode: bool,

    /// Directory the artifacts are published to
    #[arg(short, long, env = "XCARCHIVER_OUTPUT_DIR", value_name = "PATH")]
    pub output_dir: PathBuf,

    /// Publish every dSYM bundle found in the archive
    #[arg(
        long,
        env = "XCARCHIVER_EXPORT_ALL_DSYMS",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_name = "BOOL"
    )]
    pub export_all_dsyms: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl From<Args> for RawInputs {
    fn from(args: Args) -> Self {
        RawInputs {
            project_path: args.project_path,
            scheme: args.scheme,
            configuration: args.configuration,
            log_formatter: args.log_formatter,
            xcode_major_version: args.xcode_major_version,
            artifact_name: args.artifact_name,
            automatic_code_signing: args.automatic_code_signing,
            perform_clean_action: args.perform_clean_action,
            xcconfig_content: args.xcconfig_content,
            xcodebuild_options: args.xcodebuild_options,
            cache_level: args.cache_level,
            export_options_plist_content: args.export_options_plist_content,
            distribution_method: args.distribution_method,
            icloud_container_environment: args.icloud_container_environment,
            export_development_team: args.export_development_team,
            upload_bitcode: args.upload_bitcode,
            compile_bitcode: args.compile_bitcode,
            output_dir: args.output_dir,
            export_all_dsyms: args.export_all_dsyms,
        }
    }
}
