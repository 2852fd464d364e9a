//! Shared test doubles for the pipeline's collaborator seams.
#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use xcarchiver::archiver::{
    CacheLevel, CodesignManager, CodesignOpts, CommandExecutor, CommandOutput, CommandSpec,
    ExportMethod, LogFormatter, RawInputs, RunOpts, SigningContext, SpawnError,
    XcodeVersion, XcodeVersionProvider, XcodebuildArchiver,
};

/// Scripted command executor.
///
/// Recognizes the pipeline's invocations by shape (version probe, gem
/// install, archive, export) and mimics xcodebuild's observable side
/// effects: a successful archive creates the .xcarchive bundle with a dSYM
/// inside, a successful export drops an .ipa into the export directory.
pub struct ScriptedExecutor {
    pub toolchain_ok: bool,
    pub xcpretty_present: Arc<Mutex<bool>>,
    pub gem_install_ok: bool,
    pub archive_exit: i32,
    pub archive_transcript: String,
    pub export_exit: i32,
    pub export_transcript: String,
    pub invocations: Arc<Mutex<Vec<CommandSpec>>>,
}

impl Default for ScriptedExecutor {
    fn default() -> Self {
        Self {
            toolchain_ok: true,
            xcpretty_present: Arc::new(Mutex::new(true)),
            gem_install_ok: true,
            archive_exit: 0,
            archive_transcript: "** ARCHIVE SUCCEEDED **".to_string(),
            export_exit: 0,
            export_transcript: "** EXPORT SUCCEEDED **".to_string(),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ScriptedExecutor {
    pub fn arg_value(spec: &CommandSpec, flag: &str) -> Option<PathBuf> {
        let idx = spec.args.iter().position(|a| a == flag)?;
        spec.args.get(idx + 1).map(PathBuf::from)
    }

    fn output(code: i32, transcript: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(code),
            transcript: transcript.to_string(),
        }
    }
}

impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, SpawnError> {
        self.invocations.lock().unwrap().push(spec.clone());

        match spec.program.as_str() {
            "xcodebuild" if spec.args.iter().any(|a| a == "-version") => {
                if self.toolchain_ok {
                    Ok(Self::output(0, "Xcode 15.2\nBuild version 15C500b"))
                } else {
                    Ok(Self::output(
                        1,
                        "xcode-select: error: tool 'xcodebuild' requires Xcode",
                    ))
                }
            }
            "xcpretty" => {
                if *self.xcpretty_present.lock().unwrap() {
                    Ok(Self::output(0, "0.3.0"))
                } else {
                    Err(SpawnError {
                        program: "xcpretty".to_string(),
                        source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
                    })
                }
            }
            "gem" => {
                if self.gem_install_ok {
                    *self.xcpretty_present.lock().unwrap() = true;
                    Ok(Self::output(0, "1 gem installed"))
                } else {
                    Ok(Self::output(1, "ERROR:  Error installing xcpretty"))
                }
            }
            "xcodebuild" if spec.args.iter().any(|a| a == "-exportArchive") => {
                if self.export_exit == 0 {
                    if let Some(dir) = Self::arg_value(spec, "-exportPath") {
                        std::fs::create_dir_all(&dir).expect("create export dir");
                        std::fs::write(dir.join("App.ipa"), b"ipa payload").expect("write ipa");
                    }
                }
                Ok(Self::output(self.export_exit, &self.export_transcript))
            }
            "xcodebuild" if spec.args.iter().any(|a| a == "archive") => {
                if self.archive_exit == 0 {
                    if let Some(dir) = Self::arg_value(spec, "-archivePath") {
                        std::fs::create_dir_all(dir.join("Products")).expect("create archive");
                        std::fs::write(dir.join("Info.plist"), b"<plist/>")
                            .expect("write archive Info.plist");
                        let dsym = dir.join("dSYMs").join("App.app.dSYM").join("Contents");
                        std::fs::create_dir_all(&dsym).expect("create dSYM");
                        std::fs::write(dsym.join("Info.plist"), b"<plist/>")
                            .expect("write dSYM Info.plist");
                    }
                }
                Ok(Self::output(self.archive_exit, &self.archive_transcript))
            }
            _ => Ok(Self::output(0, "")),
        }
    }
}

/// Code-signing manager that counts prepares and teardowns.
#[derive(Default)]
pub struct CountingCodesign {
    pub prepares: Arc<AtomicUsize>,
    pub teardowns: Arc<AtomicUsize>,
    pub fail_prepare: bool,
}

impl CountingCodesign {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodesignManager for CountingCodesign {
    fn prepare(&self, _opts: &CodesignOpts) -> anyhow::Result<Box<dyn SigningContext>> {
        if self.fail_prepare {
            anyhow::bail!("no signing assets available");
        }
        self.prepares.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingContext {
            teardowns: self.teardowns.clone(),
        }))
    }
}

struct CountingContext {
    teardowns: Arc<AtomicUsize>,
}

impl SigningContext for CountingContext {}

impl Drop for CountingContext {
    fn drop(&mut self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Version provider returning a fixed major version.
pub struct StaticVersionProvider {
    pub major: u32,
}

impl XcodeVersionProvider for StaticVersionProvider {
    fn version(&self) -> anyhow::Result<XcodeVersion> {
        Ok(XcodeVersion {
            major: self.major,
            raw: format!("Xcode {}.0", self.major),
        })
    }
}

/// Version provider that always fails, for pin-vs-detect tests.
pub struct FailingVersionProvider;

impl XcodeVersionProvider for FailingVersionProvider {
    fn version(&self) -> anyhow::Result<XcodeVersion> {
        anyhow::bail!("xcodebuild not found in PATH")
    }
}

pub type TestArchiver = XcodebuildArchiver<ScriptedExecutor, CountingCodesign, StaticVersionProvider>;

/// Archiver wired with scripted collaborators and Xcode 15.
pub fn test_archiver(executor: ScriptedExecutor, codesign: CountingCodesign) -> TestArchiver {
    XcodebuildArchiver::new(executor, codesign, StaticVersionProvider { major: 15 })
}

/// Valid raw inputs rooted in a scratch directory; creates the fake
/// project bundle on disk.
pub fn project_inputs(root: &Path) -> RawInputs {
    let project = root.join("App.xcodeproj");
    std::fs::create_dir_all(&project).expect("create project dir");
    RawInputs {
        project_path: project,
        scheme: "App".to_string(),
        output_dir: root.join("deploy"),
        cache_level: "none".to_string(),
        ..Default::default()
    }
}

/// Run options equivalent to [`project_inputs`] with signing disabled.
pub fn project_run_opts(root: &Path) -> RunOpts {
    let project = root.join("App.xcodeproj");
    std::fs::create_dir_all(&project).expect("create project dir");
    RunOpts {
        project_path: project,
        scheme: "App".to_string(),
        configuration: None,
        log_formatter: LogFormatter::Xcodebuild,
        xcode_major_version: 15,
        artifact_name: "App".to_string(),
        codesign: None,
        perform_clean_action: false,
        xcconfig_content: None,
        additional_options: Vec::new(),
        cache_level: CacheLevel::None,
        custom_export_options_content: None,
        export_method: ExportMethod::Development,
        icloud_container_environment: None,
        export_development_team: None,
        upload_bitcode: true,
        compile_bitcode: true,
    }
}
