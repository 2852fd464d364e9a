//! External command execution and output capture.
//!
//! The pipeline never launches processes directly; it goes through the
//! [`CommandExecutor`] seam so the run logic stays testable. The production
//! [`ShellExecutor`] streams combined stdout/stderr line by line, echoing
//! raw output or feeding it through an `xcpretty` child for display, while
//! always capturing the raw transcript for the log artifacts.

use std::process::Stdio;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::Mutex;

/// A fully resolved external command invocation.
#[derive(Clone, Debug)]
pub struct CommandSpec {
    /// Program to launch
    pub program: String,
    /// Arguments in order
    pub args: Vec<String>,
    /// Render output through the pretty formatter while capturing
    pub pretty: bool,
}

impl CommandSpec {
    /// Creates a spec for `program` with the given arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            pretty: false,
        }
    }

    /// Sets whether output is rendered through the pretty formatter.
    ///
    /// Rendering only; the launched command is identical either way.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Human-readable form of the invocation for progress logging.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Result of running a command to completion.
#[derive(Clone, Debug, Default)]
pub struct CommandOutput {
    /// Process exit code; None when terminated by a signal
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr, in arrival order
    pub transcript: String,
}

impl CommandOutput {
    /// Whether the command exited with code zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A command could not be launched or waited on.
#[derive(Error, Debug)]
#[error("failed to launch `{program}`: {source}")]
pub struct SpawnError {
    /// The program that failed to launch
    pub program: String,
    /// Underlying IO error
    pub source: std::io::Error,
}

/// Launches external processes and captures their combined output.
///
/// A spawn failure is the only error; a non-zero exit comes back as a
/// normal [`CommandOutput`] so callers keep the transcript for diagnostics.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor {
    /// Runs the command to completion.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, SpawnError>;
}

/// Production executor backed by `tokio::process`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    /// Creates a new shell executor.
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for ShellExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, SpawnError> {
        log::info!("$ {}", spec.display());

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SpawnError {
                program: spec.program.clone(),
                source,
            })?;

        let mut formatter = if spec.pretty { spawn_formatter() } else { None };
        let formatter_stdin = formatter.as_mut().and_then(|child| child.stdin.take());

        let sink = Arc::new(Mutex::new(OutputSink {
            transcript: String::new(),
            formatter_stdin,
        }));

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        tokio::join!(
            async {
                if let Some(out) = stdout {
                    drain(out, &sink).await;
                }
            },
            async {
                if let Some(err) = stderr {
                    drain(err, &sink).await;
                }
            },
        );

        let status = child.wait().await.map_err(|source| SpawnError {
            program: spec.program.clone(),
            source,
        })?;

        let transcript = {
            let mut sink = sink.lock().await;
            // Dropping the stdin handle closes the formatter's input pipe
            sink.formatter_stdin = None;
            std::mem::take(&mut sink.transcript)
        };

        if let Some(mut formatter) = formatter {
            let _ = formatter.wait().await;
        }

        Ok(CommandOutput {
            exit_code: status.code(),
            transcript,
        })
    }
}

/// Collects the raw transcript and routes each line to the display channel.
struct OutputSink {
    transcript: String,
    formatter_stdin: Option<ChildStdin>,
}

impl OutputSink {
    async fn push(&mut self, line: &str) {
        self.transcript.push_str(line);
        self.transcript.push('\n');

        if let Some(stdin) = self.formatter_stdin.as_mut() {
            let fed = stdin.write_all(line.as_bytes()).await.is_ok()
                && stdin.write_all(b"\n").await.is_ok();
            if !fed {
                // Formatter went away mid-stream; fall back to raw echo
                self.formatter_stdin = None;
                println!("{line}");
            }
        } else {
            println!("{line}");
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: R, sink: &Arc<Mutex<OutputSink>>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        sink.lock().await.push(&line).await;
    }
}

fn spawn_formatter() -> Option<Child> {
    let program = match which::which("xcpretty") {
        Ok(path) => path,
        Err(e) => {
            log::warn!("xcpretty not found, printing raw xcodebuild output: {e}");
            return None;
        }
    };

    match Command::new(&program).stdin(Stdio::piped()).spawn() {
        Ok(child) => Some(child),
        Err(e) => {
            log::warn!("failed to start xcpretty, printing raw xcodebuild output: {e}");
            None
        }
    }
}
