//! Input validation and normalization.
//!
//! Raw inputs arrive as strings from the CLI/environment surface and leave
//! as a typed, internally consistent [`Config`]. Validation has no side
//! effects beyond filesystem path resolution.

use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;

use super::config::{
    CacheLevel, CodesignOpts, CodesignStrategy, Config, ExportMethod, LogFormatter,
};
use super::error::ConfigError;
use super::xcodebuild::XcodeVersionProvider;
use super::XcodebuildArchiver;

/// Export options generation needs Xcode 11 semantics or newer
const MIN_SUPPORTED_XCODE_MAJOR: u32 = 11;

/// Unvalidated inputs as they come off the CLI/environment surface.
#[derive(Clone, Debug)]
pub struct RawInputs {
    /// Path to the .xcodeproj or .xcworkspace
    pub project_path: PathBuf,
    /// Scheme to archive
    pub scheme: String,
    /// Build configuration override
    pub configuration: Option<String>,
    /// Log formatter name
    pub log_formatter: String,
    /// Pinned Xcode major version, if any
    pub xcode_major_version: Option<u32>,
    /// Artifact base name override
    pub artifact_name: Option<String>,
    /// Automatic code signing strategy name
    pub automatic_code_signing: String,
    /// Run the clean action before archiving
    pub perform_clean_action: bool,
    /// Build settings override content
    pub xcconfig_content: Option<String>,
    /// Additional xcodebuild options, whitespace separated
    pub xcodebuild_options: String,
    /// Cache policy name
    pub cache_level: String,
    /// Caller-supplied export options plist content
    pub export_options_plist_content: Option<String>,
    /// Distribution method name
    pub distribution_method: String,
    /// iCloud container environment
    pub icloud_container_environment: Option<String>,
    /// Development team for export
    pub export_development_team: Option<String>,
    /// Include bitcode in App Store exports
    pub upload_bitcode: bool,
    /// Recompile from bitcode in other exports
    pub compile_bitcode: bool,
    /// Output directory
    pub output_dir: PathBuf,
    /// Publish every dSYM found in the archive
    pub export_all_dsyms: bool,
}

impl Default for RawInputs {
    fn default() -> Self {
        Self {
            project_path: PathBuf::new(),
            scheme: String::new(),
            configuration: None,
            log_formatter: "xcodebuild".to_string(),
            xcode_major_version: None,
            artifact_name: None,
            automatic_code_signing: "off".to_string(),
            perform_clean_action: false,
            xcconfig_content: None,
            xcodebuild_options: String::new(),
            cache_level: "swift_packages".to_string(),
            export_options_plist_content: None,
            distribution_method: "development".to_string(),
            icloud_container_environment: None,
            export_development_team: None,
            upload_bitcode: true,
            compile_bitcode: true,
            output_dir: PathBuf::new(),
            export_all_dsyms: true,
        }
    }
}

impl<E, C, V: XcodeVersionProvider> XcodebuildArchiver<E, C, V> {
    /// Validates and normalizes raw inputs into a [`Config`].
    ///
    /// Checks that mutually dependent inputs are consistent, resolves
    /// relative paths, and determines the effective Xcode major version by
    /// querying the version provider when no pin is given.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when required inputs are missing, paths
    /// cannot be resolved, or declared options are incompatible.
    pub fn process_inputs(&self, inputs: RawInputs) -> Result<Config, ConfigError> {
        if inputs.scheme.trim().is_empty() {
            return Err(ConfigError::MissingInput { name: "scheme" });
        }
        if inputs.project_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput {
                name: "project-path",
            });
        }
        if inputs.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput { name: "output-dir" });
        }

        let project_path = absolutize(&inputs.project_path)?;
        if !project_path.exists() {
            return Err(ConfigError::ProjectNotFound { path: project_path });
        }
        match project_path.extension().and_then(|e| e.to_str()) {
            Some("xcodeproj") | Some("xcworkspace") => {}
            _ => return Err(ConfigError::UnsupportedProjectType { path: project_path }),
        }
        let output_dir = absolutize(&inputs.output_dir)?;

        let log_formatter: LogFormatter =
            inputs
                .log_formatter
                .parse()
                .map_err(|reason| ConfigError::InvalidInput {
                    name: "log-formatter",
                    value: inputs.log_formatter.clone(),
                    reason,
                })?;
        let export_method: ExportMethod =
            inputs
                .distribution_method
                .parse()
                .map_err(|reason| ConfigError::InvalidInput {
                    name: "distribution-method",
                    value: inputs.distribution_method.clone(),
                    reason,
                })?;
        let cache_level: CacheLevel =
            inputs
                .cache_level
                .parse()
                .map_err(|reason| ConfigError::InvalidInput {
                    name: "cache-level",
                    value: inputs.cache_level.clone(),
                    reason,
                })?;

        let additional_options: Vec<String> = inputs
            .xcodebuild_options
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        let xcconfig_content = inputs.xcconfig_content.filter(|c| !c.trim().is_empty());
        if xcconfig_content.is_some() && additional_options.iter().any(|o| o == "-xcconfig") {
            return Err(ConfigError::ConflictingXcconfig);
        }

        let xcode_major_version = match inputs.xcode_major_version {
            Some(major) => major,
            None => {
                let version = self
                    .xcode_version_provider
                    .version()
                    .map_err(|e| ConfigError::XcodeVersion(e.to_string()))?;
                log::info!("detected {version}");
                version.major
            }
        };
        if xcode_major_version < MIN_SUPPORTED_XCODE_MAJOR {
            return Err(ConfigError::UnsupportedXcodeVersion {
                major: xcode_major_version,
                min: MIN_SUPPORTED_XCODE_MAJOR,
            });
        }

        let custom_export_options_content = inputs
            .export_options_plist_content
            .filter(|c| !c.trim().is_empty());
        if custom_export_options_content.is_some() {
            log::warn!(
                "custom export options provided, the distribution method and related export inputs are ignored"
            );
        }

        let artifact_name = match inputs.artifact_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => inputs.scheme.clone(),
        };

        let codesign = match inputs.automatic_code_signing.as_str() {
            "off" => None,
            "api-key" => Some(CodesignOpts {
                strategy: CodesignStrategy::ApiKey,
                development_team: inputs.export_development_team.clone(),
            }),
            "apple-id" => Some(CodesignOpts {
                strategy: CodesignStrategy::AppleId,
                development_team: inputs.export_development_team.clone(),
            }),
            other => {
                return Err(ConfigError::InvalidInput {
                    name: "automatic-code-signing",
                    value: other.to_string(),
                    reason: "expected one of `off`, `api-key`, `apple-id`".to_string(),
                });
            }
        };

        Ok(Config {
            project_path,
            scheme: inputs.scheme,
            configuration: inputs.configuration.filter(|c| !c.trim().is_empty()),
            log_formatter,
            xcode_major_version,
            artifact_name,
            codesign,
            perform_clean_action: inputs.perform_clean_action,
            xcconfig_content,
            additional_options,
            cache_level,
            custom_export_options_content,
            export_method,
            icloud_container_environment: inputs.icloud_container_environment,
            export_development_team: inputs.export_development_team,
            upload_bitcode: inputs.upload_bitcode,
            compile_bitcode: inputs.compile_bitcode,
            output_dir,
            export_all_dsyms: inputs.export_all_dsyms,
        })
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    path.absolutize()
        .map(|resolved| resolved.into_owned())
        .map_err(|source| ConfigError::PathResolve {
            path: path.to_path_buf(),
            source,
        })
}
