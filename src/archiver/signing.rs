//! Code signing setup and temporary keychain management.
//!
//! The pipeline treats signing as an opaque capability: a manager prepares
//! signing assets before the build and hands back a [`SigningContext`]
//! whose drop tears down everything temporary it created. Holding the
//! context across the build/export steps guarantees teardown on every exit
//! path, success or failure.

use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use base64::Engine;
use uuid::Uuid;
use wait_timeout::ChildExt;

use super::config::CodesignOpts;

/// Keychain cleanup must not hang the step if `security` wedges
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Live signing context for one run.
///
/// Implementations release their temporary resources (keychain, profiles)
/// in `Drop`, which the runner relies on for exactly-once teardown.
pub trait SigningContext: Send {
    /// Signing identity resolved during preparation, when one is known.
    fn signing_identity(&self) -> Option<&str> {
        None
    }
}

/// Prepares code signing assets for a run.
pub trait CodesignManager {
    /// Acquires signing assets and returns the context guarding them.
    fn prepare(&self, opts: &CodesignOpts) -> anyhow::Result<Box<dyn SigningContext>>;
}

/// Production manager that imports a certificate from the environment.
///
/// - `APPLE_CERTIFICATE`: base64-encoded .p12 imported into a temp keychain
/// - `APPLE_CERTIFICATE_PASSWORD`: passphrase for the .p12
///
/// Without a certificate payload in the environment, preparation succeeds
/// with nothing to tear down and signing relies on the default keychain.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCodesignManager;

impl EnvCodesignManager {
    /// Creates a new environment-backed manager.
    pub fn new() -> Self {
        Self
    }
}

impl CodesignManager for EnvCodesignManager {
    fn prepare(&self, opts: &CodesignOpts) -> anyhow::Result<Box<dyn SigningContext>> {
        log::info!("preparing code signing assets ({} strategy)", opts.strategy);
        if let Some(team) = &opts.development_team {
            log::debug!("signing assets must belong to team {team}");
        }

        let (Ok(cert_b64), Ok(password)) = (
            std::env::var("APPLE_CERTIFICATE"),
            std::env::var("APPLE_CERTIFICATE_PASSWORD"),
        ) else {
            log::debug!("no certificate payload in the environment, using the default keychain");
            return Ok(Box::new(DefaultKeychain));
        };

        let cert_bytes = base64::engine::general_purpose::STANDARD
            .decode(cert_b64.trim())
            .context("APPLE_CERTIFICATE is not valid base64")?;

        let keychain = TempKeychain::import(&cert_bytes, password.trim())?;
        Ok(Box::new(keychain))
    }
}

/// Context for runs that sign against the user's existing keychain.
struct DefaultKeychain;

impl SigningContext for DefaultKeychain {}

/// A uniquely named keychain holding an imported certificate.
///
/// Deleted on drop with a bounded wait.
pub struct TempKeychain {
    name: String,
}

impl TempKeychain {
    /// Imports a .p12 certificate into a fresh keychain and makes it
    /// searchable by codesign.
    pub fn import(cert_bytes: &[u8], cert_password: &str) -> anyhow::Result<Self> {
        let name = format!("xcarchiver-{}.keychain", Uuid::new_v4());
        let keychain_password = Uuid::new_v4().to_string();

        let mut cert_file =
            tempfile::NamedTempFile::new().context("creating certificate scratch file")?;
        cert_file
            .write_all(cert_bytes)
            .context("writing certificate payload")?;
        let cert_path = cert_file.path().to_string_lossy().into_owned();

        security(&["create-keychain", "-p", &keychain_password, &name])?;
        security(&["set-keychain-settings", "-lut", "21600", &name])?;
        security(&["unlock-keychain", "-p", &keychain_password, &name])?;
        security(&[
            "import",
            &cert_path,
            "-k",
            &name,
            "-P",
            cert_password,
            "-T",
            "/usr/bin/codesign",
        ])?;
        security(&[
            "set-key-partition-list",
            "-S",
            "apple-tool:,apple:",
            "-k",
            &keychain_password,
            &name,
        ])?;
        security(&["list-keychains", "-d", "user", "-s", &name, "login.keychain"])?;

        log::info!("imported signing certificate into temporary keychain {name}");
        Ok(Self { name })
    }
}

impl SigningContext for TempKeychain {}

impl Drop for TempKeychain {
    fn drop(&mut self) {
        let spawned = std::process::Command::new("security")
            .args(["delete-keychain", &self.name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => match child.wait_timeout(TEARDOWN_TIMEOUT) {
                Ok(Some(status)) if status.success() => {
                    log::debug!("deleted temporary keychain {}", self.name);
                }
                Ok(Some(status)) => {
                    log::warn!(
                        "deleting temporary keychain {} exited with {status}",
                        self.name
                    );
                }
                Ok(None) => {
                    let _ = child.kill();
                    log::warn!("timed out deleting temporary keychain {}", self.name);
                }
                Err(e) => {
                    log::warn!("failed to wait for keychain cleanup: {e}");
                }
            },
            Err(e) => {
                log::warn!("failed to delete temporary keychain {}: {e}", self.name);
            }
        }
    }
}

fn security(args: &[&str]) -> anyhow::Result<()> {
    let action = args.first().copied().unwrap_or("security");
    let output = std::process::Command::new("security")
        .args(args)
        .output()
        .with_context(|| format!("running security {action}"))?;
    anyhow::ensure!(
        output.status.success(),
        "security {action} failed: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(())
}
