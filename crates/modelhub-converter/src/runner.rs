//! Converter invocation: argument vector, executable resolution, and exit
//! status classification.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use modelhub_core::config::ConverterConfig;
use modelhub_core::config::converter::is_path_like;
use tracing::{error, info, warn};

use crate::error::ConversionError;
use crate::models::{ConversionOutput, StagedJob};
use crate::process::{ProcessError, ProcessInvocation, ProcessRunner};

/// Subcommand that makes the converter write a file in another format.
pub const EXPORT_SUBCOMMAND: &str = "export";

/// Platform-specific converter location relative to the tool root.
pub fn platform_executable() -> &'static str {
    if cfg!(target_os = "windows") {
        "win32/assimp.exe"
    } else if cfg!(target_os = "macos") {
        "osx/assimp"
    } else {
        "linux/assimp"
    }
}

/// Resolve the converter executable from configuration.
///
/// An explicit `tool_path` wins; otherwise the platform binary under
/// `tool_root` is used. Locations are made absolute because the converter
/// is launched from inside the job directory.
pub fn resolve_executable(config: &ConverterConfig) -> PathBuf {
    let executable = if config.tool_path.as_os_str().is_empty() {
        config.tool_root.join(platform_executable())
    } else if is_path_like(&config.tool_path) {
        config.tool_path.clone()
    } else {
        return config.tool_path.clone();
    };
    std::path::absolute(&executable).unwrap_or(executable)
}

/// Full argument vector for a staged job.
pub fn build_arguments(job: &StagedJob) -> Vec<String> {
    let mut args = Vec::with_capacity(3 + job.arguments.len());
    args.push(EXPORT_SUBCOMMAND.to_string());
    args.push(job.input_path.to_string_lossy().into_owned());
    args.push(job.output_path.to_string_lossy().into_owned());
    args.extend(job.arguments.iter().cloned());
    args
}

/// Drives the external converter for one staged job.
#[derive(Debug, Clone)]
pub struct ConversionRunner {
    /// Converter executable.
    executable: PathBuf,
    /// Wall-clock limit per invocation.
    timeout: Duration,
    /// Process execution backend.
    process: Arc<dyn ProcessRunner>,
}

impl ConversionRunner {
    /// Create a runner for `executable` using `process` to spawn it.
    pub fn new(executable: PathBuf, timeout: Duration, process: Arc<dyn ProcessRunner>) -> Self {
        Self {
            executable,
            timeout,
            process,
        }
    }

    /// Create a runner from configuration.
    pub fn from_config(config: &ConverterConfig, process: Arc<dyn ProcessRunner>) -> Self {
        let executable = resolve_executable(config);
        if executable.exists() {
            info!(path = %executable.display(), "Converter executable found");
        } else {
            warn!(
                path = %executable.display(),
                "Converter executable not found, conversions will fail to launch"
            );
        }
        Self::new(
            executable,
            Duration::from_secs(config.timeout_seconds),
            process,
        )
    }

    /// Converter executable in use.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run the converter on `job`.
    ///
    /// A zero exit code is success. A nonzero exit (or signal termination)
    /// yields [`ConversionError::ConversionProcess`] with the captured output.
    pub async fn run(&self, job: &StagedJob) -> Result<ConversionOutput, ConversionError> {
        let invocation = ProcessInvocation {
            program: self.executable.clone(),
            args: build_arguments(job),
            working_dir: job.working_directory.clone(),
            timeout: self.timeout,
        };

        info!(
            args = %invocation.args.join(" "),
            "Calling converter"
        );

        let output = self
            .process
            .run(&invocation)
            .await
            .map_err(|e| match e {
                ProcessError::Launch { program, source } => {
                    error!(program = %program.display(), error = %source, "Converter failed to launch");
                    ConversionError::Launch { program, source }
                }
                ProcessError::Timeout(limit) => ConversionError::Timeout {
                    timeout_seconds: limit.as_secs(),
                },
                ProcessError::Io(source) => ConversionError::Io(source),
            })?;

        if !output.success() {
            error!(
                code = ?output.exit_code,
                elapsed_ms = output.duration.as_millis() as u64,
                stderr = %output.stderr,
                "Converter failed"
            );
            return Err(ConversionError::ConversionProcess {
                code: output.exit_code,
                stderr: output.stderr,
                stdout: output.stdout,
            });
        }

        info!(
            elapsed_ms = output.duration.as_millis() as u64,
            output = %job.output_path.display(),
            "Conversion successful"
        );

        Ok(ConversionOutput {
            output_path: job.output_path.clone(),
            stdout: output.stdout,
            stderr: output.stderr,
            duration: output.duration,
        })
    }
}
