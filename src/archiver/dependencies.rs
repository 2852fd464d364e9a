//! Dependency verification and installation.
//!
//! The toolchain itself is load-bearing: a broken xcodebuild aborts the
//! pipeline before any build is attempted. The pretty log formatter is a
//! cosmetic convenience, so every failure on its install path is reported
//! as the recoverable [`DependencyError::FormatterInstall`] kind and the
//! orchestrator degrades to raw output instead of failing the build.

use super::command::{CommandExecutor, CommandSpec};
use super::error::DependencyError;
use super::XcodebuildArchiver;

/// Options for dependency preparation.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnsureDependenciesOpts {
    /// The chosen log formatter needs the xcpretty tool
    pub xcpretty: bool,
}

impl<E: CommandExecutor, C, V> XcodebuildArchiver<E, C, V> {
    /// Verifies the toolchain and installs the pretty formatter if wanted.
    ///
    /// # Errors
    ///
    /// [`DependencyError::MissingToolchain`] when xcodebuild does not
    /// respond (fatal), [`DependencyError::FormatterInstall`] when the
    /// xcpretty install path fails (recoverable by downgrading the
    /// formatter).
    pub async fn ensure_dependencies(
        &self,
        opts: &EnsureDependenciesOpts,
    ) -> Result<(), DependencyError> {
        let probe = CommandSpec::new("xcodebuild", ["-version"]);
        match self.executor.run(&probe).await {
            Ok(output) if output.success() => {}
            Ok(output) => {
                return Err(DependencyError::MissingToolchain {
                    reason: format!(
                        "`xcodebuild -version` exited with code {:?}: {}",
                        output.exit_code,
                        output.transcript.trim()
                    ),
                });
            }
            Err(e) => {
                return Err(DependencyError::MissingToolchain {
                    reason: e.to_string(),
                });
            }
        }

        if !opts.xcpretty {
            return Ok(());
        }

        if let Some(version) = self.xcpretty_version().await {
            log::info!("using xcpretty {version}");
            return Ok(());
        }

        log::info!("xcpretty is not installed, installing with gem");
        let install = CommandSpec::new("gem", ["install", "xcpretty", "--no-document"]);
        match self.executor.run(&install).await {
            Ok(output) if output.success() => {}
            Ok(output) => {
                return Err(DependencyError::FormatterInstall {
                    reason: format!(
                        "`gem install xcpretty` exited with code {:?}: {}",
                        output.exit_code,
                        output.transcript.trim()
                    ),
                });
            }
            Err(e) => {
                return Err(DependencyError::FormatterInstall {
                    reason: e.to_string(),
                });
            }
        }

        match self.xcpretty_version().await {
            Some(version) => {
                log::info!("installed xcpretty {version}");
                Ok(())
            }
            None => Err(DependencyError::FormatterInstall {
                reason: "xcpretty is still not runnable after install".to_string(),
            }),
        }
    }

    async fn xcpretty_version(&self) -> Option<String> {
        let probe = CommandSpec::new("xcpretty", ["--version"]);
        match self.executor.run(&probe).await {
            Ok(output) if output.success() => Some(output.transcript.trim().to_string()),
            _ => None,
        }
    }
}
