//! External process execution behind a narrow, substitutable interface.
//!
//! [`TokioProcessRunner`] spawns the child, drains stdout and stderr
//! concurrently while it runs, and enforces a wall-clock timeout by killing
//! the child on expiry.

use std::fmt::Debug;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// What to run.
#[derive(Debug, Clone)]
pub struct ProcessInvocation {
    /// Executable to spawn.
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory of the child.
    pub working_dir: PathBuf,
    /// Wall-clock limit.
    pub timeout: Duration,
}

/// How a process that ran to completion ended.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output (tail, bounded).
    pub stdout: String,
    /// Captured standard error (tail, bounded).
    pub stderr: String,
    /// Time between spawn and exit.
    pub duration: Duration,
}

impl ProcessOutput {
    /// Returns `true` for a zero exit code.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Failures that prevent a process from producing an exit status.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process could not be started.
    #[error("Failed to spawn {program}: {source}")]
    Launch {
        /// Executable that failed to start.
        program: PathBuf,
        /// Spawn error.
        source: std::io::Error,
    },

    /// The process exceeded its timeout and was killed.
    #[error("Process timed out after {0:?}")]
    Timeout(Duration),

    /// Waiting on the process failed.
    #[error("IO error while waiting for process: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs an external program to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync + Debug {
    /// Run `invocation` and report how it ended.
    async fn run(&self, invocation: &ProcessInvocation) -> Result<ProcessOutput, ProcessError>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    /// Per-stream cap on retained diagnostic text.
    max_capture_bytes: usize,
}

impl TokioProcessRunner {
    /// Create a runner keeping at most `max_capture_bytes` of each stream.
    pub fn new(max_capture_bytes: usize) -> Self {
        Self { max_capture_bytes }
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new(64 * 1024)
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &ProcessInvocation) -> Result<ProcessOutput, ProcessError> {
        let mut cmd = Command::new(&invocation.program);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd.args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            program = %invocation.program.display(),
            args = ?invocation.args,
            cwd = %invocation.working_dir.display(),
            timeout_s = invocation.timeout.as_secs(),
            "Spawning process"
        );

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| ProcessError::Launch {
            program: invocation.program.clone(),
            source,
        })?;

        let stdout_task = child
            .stdout
            .take()
            .map(|out| spawn_drain(out, "stdout", self.max_capture_bytes));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| spawn_drain(err, "stderr", self.max_capture_bytes));

        // Race: process completion vs timeout
        let status = tokio::select! {
            result = child.wait() => result?,
            _ = tokio::time::sleep(invocation.timeout) => {
                error!(
                    program = %invocation.program.display(),
                    timeout_s = invocation.timeout.as_secs(),
                    "Process timed out, killing"
                );
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed out process");
                }
                abort_drain(stdout_task);
                abort_drain(stderr_task);
                return Err(ProcessError::Timeout(invocation.timeout));
            }
        };

        let duration = start.elapsed();
        let stdout = collect_drain(stdout_task).await;
        let stderr = collect_drain(stderr_task).await;

        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout,
            stderr,
            duration,
        })
    }
}

/// Read `stream` line by line until EOF, logging each line and keeping the
/// last `cap` bytes.
fn spawn_drain<R>(stream: R, name: &'static str, cap: usize) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        let mut captured = String::new();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    debug!(stream = name, line = %line, "converter output");
                    captured.push_str(&line);
                    captured.push('\n');
                    truncate_front(&mut captured, cap);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(stream = name, error = %e, "Failed to read process output");
                    break;
                }
            }
        }

        captured
    })
}

async fn collect_drain(task: Option<JoinHandle<String>>) -> String {
    match task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

fn abort_drain(task: Option<JoinHandle<String>>) {
    if let Some(handle) = task {
        handle.abort();
    }
}

/// Drop leading bytes so that `text` is at most `cap` bytes, on a char boundary.
fn truncate_front(text: &mut String, cap: usize) {
    if text.len() <= cap {
        return;
    }
    let mut cut = text.len() - cap;
    while !text.is_char_boundary(cut) {
        cut += 1;
    }
    text.drain(..cut);
}
