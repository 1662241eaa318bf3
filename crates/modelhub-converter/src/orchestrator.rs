//! Request orchestration: output format resolution, staging, conversion,
//! and working directory cleanup.

use std::path::Path;
use std::sync::Arc;

use modelhub_core::config::ConverterConfig;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use crate::error::ConversionError;
use crate::formats::{self, FormatDescriptor};
use crate::models::{ConversionRequest, FileResponse, StagedJob};
use crate::process::ProcessRunner;
use crate::runner::ConversionRunner;
use crate::stager::Stager;

/// Composes [`Stager`] and [`ConversionRunner`] into one request pipeline.
#[derive(Debug, Clone)]
pub struct RequestOrchestrator {
    stager: Stager,
    runner: ConversionRunner,
    /// Output format used when the request names none or an unknown one.
    default_output: FormatDescriptor,
    /// Limits concurrently running converter processes.
    limiter: Arc<Semaphore>,
    cleanup_staging: bool,
}

impl RequestOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        runner: ConversionRunner,
        default_output: FormatDescriptor,
        max_concurrent_conversions: usize,
        cleanup_staging: bool,
    ) -> Self {
        Self {
            stager: Stager::new(),
            runner,
            default_output,
            limiter: Arc::new(Semaphore::new(max_concurrent_conversions.max(1))),
            cleanup_staging,
        }
    }

    /// Create an orchestrator from configuration.
    ///
    /// An unknown `default_output` falls back to the built-in default.
    pub fn from_config(config: &ConverterConfig, process: Arc<dyn ProcessRunner>) -> Self {
        let default_output = formats::describe_output(&config.default_output)
            .or_else(|| formats::describe_output(formats::DEFAULT_OUTPUT_EXTENSION))
            .unwrap_or(formats::output_formats()[0]);

        if default_output.extension != config.default_output.to_ascii_lowercase() {
            warn!(
                configured = %config.default_output,
                using = default_output.extension,
                "Configured default output format is not exportable"
            );
        }

        Self::new(
            ConversionRunner::from_config(config, process),
            default_output,
            config.max_concurrent_conversions,
            config.cleanup_staging,
        )
    }

    /// The default output format.
    pub fn default_output(&self) -> FormatDescriptor {
        self.default_output
    }

    /// The converter runner.
    pub fn runner(&self) -> &ConversionRunner {
        &self.runner
    }

    /// Output format for a requested extension.
    ///
    /// Absent or unknown extensions resolve to the default rather than
    /// failing.
    pub fn resolve_output(&self, requested: Option<&str>) -> FormatDescriptor {
        requested
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
            .and_then(formats::describe_output)
            .unwrap_or(self.default_output)
    }

    /// Process one conversion request end to end.
    ///
    /// Staging failures abort before any process is spawned. On failure the
    /// job's working directory (if one was created) is removed when cleanup
    /// is enabled. On success the caller sends the file and then calls
    /// [`RequestOrchestrator::release`].
    #[instrument(skip(self, request), fields(files = request.uploaded_files.len()))]
    pub async fn handle(&self, request: &ConversionRequest) -> Result<FileResponse, ConversionError> {
        let output_format = self.resolve_output(request.output_extension.as_deref());

        let job = match self.stager.stage(request, output_format).await {
            Ok(job) => job,
            Err(e) => {
                log_failure(&e);
                // A failed move leaves the directory and the files already
                // moved into it.
                if let ConversionError::FileRelocation {
                    working_directory: Some(dir),
                    ..
                } = &e
                {
                    if self.cleanup_staging {
                        remove_working_directory(dir).await;
                    }
                }
                return Err(e);
            }
        };

        info!(
            input = %job.input_path.display(),
            input_type = formats::describe(&formats::extension_of(&job.input_path.to_string_lossy()))
                .map(|f| f.display_name)
                .unwrap_or("unknown"),
            output = %job.output_path.display(),
            output_type = output_format.display_name,
            "Converting model"
        );

        match self.convert(&job).await {
            Ok(response) => Ok(response),
            Err(e) => {
                log_failure(&e);
                if self.cleanup_staging {
                    remove_working_directory(&job.working_directory).await;
                }
                Err(e)
            }
        }
    }

    /// Release the working directory behind a delivered response.
    pub async fn release(&self, response: &FileResponse) {
        if self.cleanup_staging {
            remove_working_directory(&response.working_directory).await;
        }
    }

    async fn convert(&self, job: &StagedJob) -> Result<FileResponse, ConversionError> {
        let output = {
            let _permit = self.limiter.acquire().await.map_err(|_| {
                ConversionError::Io(std::io::Error::other("conversion limiter closed"))
            })?;
            self.runner.run(job).await?
        };

        match tokio::fs::metadata(&output.output_path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(ConversionError::OutputMissing {
                    path: output.output_path,
                });
            }
        }

        let file_name = output
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("converted.{}", job.output_format.extension));

        Ok(FileResponse {
            path: output.output_path,
            file_name,
            content_type: formats::content_type_for(job.output_format.extension),
            output_format: job.output_format,
            working_directory: job.working_directory.clone(),
        })
    }
}

fn log_failure(e: &ConversionError) {
    if e.is_client_error() {
        warn!(code = e.code(), error = %e, "Conversion rejected");
    } else {
        error!(code = e.code(), error = %e, "Conversion failed");
    }
}

async fn remove_working_directory(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            dir = %dir.display(),
            error = %e,
            "Failed to clean up working directory"
        ),
    }
}
