//! Input processing integration tests.
//!
//! Covers required-input validation, project path checks, incompatible
//! option detection, and Xcode version resolution.

mod support;

use std::path::PathBuf;

use tempfile::TempDir;
use xcarchiver::archiver::{
    CodesignStrategy, ConfigError, ExportMethod, LogFormatter, XcodebuildArchiver,
};

use support::{
    project_inputs, test_archiver, CountingCodesign, FailingVersionProvider, ScriptedExecutor,
};

#[test]
fn missing_scheme_is_a_configuration_error() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let mut inputs = project_inputs(tmp.path());
    inputs.scheme = String::new();

    let err = archiver.process_inputs(inputs).unwrap_err();
    assert!(matches!(err, ConfigError::MissingInput { name: "scheme" }));
}

#[test]
fn missing_project_path_is_a_configuration_error() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let mut inputs = project_inputs(tmp.path());
    inputs.project_path = PathBuf::new();

    let err = archiver.process_inputs(inputs).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingInput {
            name: "project-path"
        }
    ));
}

#[test]
fn nonexistent_project_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let mut inputs = project_inputs(tmp.path());
    inputs.project_path = tmp.path().join("Missing.xcodeproj");

    let err = archiver.process_inputs(inputs).unwrap_err();
    assert!(matches!(err, ConfigError::ProjectNotFound { .. }));
}

#[test]
fn non_xcode_project_extension_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let other = tmp.path().join("App.project");
    std::fs::create_dir_all(&other).unwrap();
    let mut inputs = project_inputs(tmp.path());
    inputs.project_path = other;

    let err = archiver.process_inputs(inputs).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedProjectType { .. }));
}

#[test]
fn xcconfig_option_conflicts_with_override_content() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let mut inputs = project_inputs(tmp.path());
    inputs.xcconfig_content = Some("OTHER_CFLAGS = -Wall".to_string());
    inputs.xcodebuild_options = "-xcconfig override.xcconfig".to_string();

    let err = archiver.process_inputs(inputs).unwrap_err();
    assert!(matches!(err, ConfigError::ConflictingXcconfig));
}

#[test]
fn invalid_log_formatter_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let mut inputs = project_inputs(tmp.path());
    inputs.log_formatter = "fancy".to_string();

    let err = archiver.process_inputs(inputs).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidInput {
            name: "log-formatter",
            ..
        }
    ));
}

#[test]
fn version_provider_is_queried_when_not_pinned() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let config = archiver.process_inputs(project_inputs(tmp.path())).unwrap();
    assert_eq!(config.xcode_major_version, 15);
}

#[test]
fn pinned_version_skips_the_provider() {
    let tmp = TempDir::new().unwrap();
    let archiver = XcodebuildArchiver::new(
        ScriptedExecutor::default(),
        CountingCodesign::new(),
        FailingVersionProvider,
    );

    let mut inputs = project_inputs(tmp.path());
    inputs.xcode_major_version = Some(14);

    let config = archiver.process_inputs(inputs).unwrap();
    assert_eq!(config.xcode_major_version, 14);
}

#[test]
fn version_detection_failure_is_a_configuration_error() {
    let tmp = TempDir::new().unwrap();
    let archiver = XcodebuildArchiver::new(
        ScriptedExecutor::default(),
        CountingCodesign::new(),
        FailingVersionProvider,
    );

    let err = archiver.process_inputs(project_inputs(tmp.path())).unwrap_err();
    assert!(matches!(err, ConfigError::XcodeVersion(_)));
}

#[test]
fn ancient_xcode_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let mut inputs = project_inputs(tmp.path());
    inputs.xcode_major_version = Some(9);

    let err = archiver.process_inputs(inputs).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnsupportedXcodeVersion { major: 9, .. }
    ));
}

#[test]
fn artifact_name_defaults_to_the_scheme() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let config = archiver.process_inputs(project_inputs(tmp.path())).unwrap();
    assert_eq!(config.artifact_name, "App");

    let mut inputs = project_inputs(tmp.path());
    inputs.artifact_name = Some("Nightly".to_string());
    let config = archiver.process_inputs(inputs).unwrap();
    assert_eq!(config.artifact_name, "Nightly");
}

#[test]
fn normalizes_enums_and_signing_options() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let mut inputs = project_inputs(tmp.path());
    inputs.log_formatter = "xcpretty".to_string();
    inputs.distribution_method = "app-store".to_string();
    inputs.automatic_code_signing = "api-key".to_string();
    inputs.export_development_team = Some("ABCDE12345".to_string());

    let config = archiver.process_inputs(inputs).unwrap();
    assert_eq!(config.log_formatter, LogFormatter::Xcpretty);
    assert_eq!(config.export_method, ExportMethod::AppStore);
    let codesign = config.codesign.expect("signing options present");
    assert_eq!(codesign.strategy, CodesignStrategy::ApiKey);
    assert_eq!(codesign.development_team.as_deref(), Some("ABCDE12345"));
}

#[test]
fn custom_export_options_are_kept_verbatim() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let mut inputs = project_inputs(tmp.path());
    inputs.export_options_plist_content = Some("<plist version=\"1.0\"/>".to_string());

    let config = archiver.process_inputs(inputs).unwrap();
    assert_eq!(
        config.custom_export_options_content.as_deref(),
        Some("<plist version=\"1.0\"/>")
    );
}
