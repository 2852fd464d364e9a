//! Export options plist generation.
//!
//! When the caller does not supply a full export options payload, one is
//! derived from the run options. Key selection follows xcodebuild's rules:
//! `uploadBitcode` only applies to App Store exports, `compileBitcode` and
//! `iCloudContainerEnvironment` only to the other methods.

use std::path::Path;

use serde::Serialize;

use super::config::ExportMethod;
use super::runner::RunOpts;

/// Keys accepted by `xcodebuild -exportOptionsPlist`.
#[derive(Debug, Serialize)]
pub struct ExportOptions {
    method: String,

    #[serde(rename = "teamID", skip_serializing_if = "Option::is_none")]
    team_id: Option<String>,

    #[serde(
        rename = "iCloudContainerEnvironment",
        skip_serializing_if = "Option::is_none"
    )]
    icloud_container_environment: Option<String>,

    #[serde(rename = "uploadBitcode", skip_serializing_if = "Option::is_none")]
    upload_bitcode: Option<bool>,

    #[serde(rename = "compileBitcode", skip_serializing_if = "Option::is_none")]
    compile_bitcode: Option<bool>,
}

/// Derives export options from the run options.
pub fn for_run(opts: &RunOpts) -> ExportOptions {
    let app_store = opts.export_method == ExportMethod::AppStore;
    ExportOptions {
        method: opts.export_method.to_string(),
        team_id: opts.export_development_team.clone(),
        icloud_container_environment: if app_store {
            None
        } else {
            opts.icloud_container_environment.clone()
        },
        upload_bitcode: app_store.then_some(opts.upload_bitcode),
        compile_bitcode: (!app_store).then_some(opts.compile_bitcode),
    }
}

/// Writes the options as an XML plist.
pub fn write(path: &Path, options: &ExportOptions) -> Result<(), plist::Error> {
    plist::to_file_xml(path, options)
}
