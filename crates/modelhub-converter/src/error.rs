//! Unified error type for the model conversion pipeline.
//!
//! Validation, staging, and process failures are consolidated into a single
//! `ConversionError` enum that maps cleanly to `modelhub_core::error::AppError`.

use std::path::PathBuf;

use modelhub_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Unified error type for all conversion operations.
#[derive(Debug, Error)]
pub enum ConversionError {
    // --- Validation errors ---
    /// None of the uploaded files has a recognized model extension.
    #[error("No model files present")]
    NoModelFile,

    /// More than one uploaded file has a recognized model extension.
    #[error("Multiple model files present ({count})")]
    MultipleModelFiles {
        /// Number of model files found.
        count: usize,
    },

    // --- Staging errors ---
    /// The per-job working directory could not be created.
    #[error("Failed to create working directory {path}: {source}")]
    DirectoryCreation {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// An uploaded file could not be moved into the working directory.
    #[error("Failed to relocate '{file}' into the working directory: {source}")]
    FileRelocation {
        /// Original name of the file being moved.
        file: String,
        /// Working directory already holding moved files, if staging got
        /// that far.
        working_directory: Option<PathBuf>,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    // --- Process execution errors ---
    /// The converter executable could not be started.
    #[error("Failed to launch converter {program}: {source}")]
    Launch {
        /// Executable that failed to start.
        program: PathBuf,
        /// Spawn error.
        source: std::io::Error,
    },

    /// The converter ran but did not exit successfully.
    #[error("An error occurred during conversion (exit code {code:?})")]
    ConversionProcess {
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
        /// Captured standard output.
        stdout: String,
    },

    /// The converter exceeded its wall-clock limit and was killed.
    #[error("Conversion timed out after {timeout_seconds}s")]
    Timeout {
        /// The timeout that was exceeded.
        timeout_seconds: u64,
    },

    /// The converter reported success but produced no output file.
    #[error("Converter exited successfully but produced no output: {path}")]
    OutputMissing {
        /// Expected output path.
        path: PathBuf,
    },

    // --- Generic errors ---
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Machine-readable code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoModelFile => "NO_MODEL_FILE",
            Self::MultipleModelFiles { .. } => "MULTIPLE_MODEL_FILES",
            Self::DirectoryCreation { .. } => "DIRECTORY_CREATION_FAILED",
            Self::FileRelocation { .. } => "FILE_RELOCATION_FAILED",
            Self::Launch { .. } => "CONVERTER_UNAVAILABLE",
            Self::ConversionProcess { .. } => "CONVERSION_FAILED",
            Self::Timeout { .. } => "CONVERSION_TIMEOUT",
            Self::OutputMissing { .. } => "OUTPUT_MISSING",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoModelFile | Self::MultipleModelFiles { .. } | Self::ConversionProcess { .. }
        )
    }
}

/// Client-facing messages for server faults carry no filesystem paths; the
/// full error is logged where it occurs.
impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        let code = err.code();
        match err {
            ConversionError::NoModelFile | ConversionError::MultipleModelFiles { .. } => {
                AppError::validation(err.to_string()).with_code(code)
            }
            ConversionError::ConversionProcess { code: exit_code, stderr, .. } => {
                AppError::unprocessable(format!(
                    "An error occurred during conversion (exit code {exit_code:?})"
                ))
                .with_code(code)
                .with_details(serde_json::json!({
                    "exit_code": exit_code,
                    "stderr": stderr,
                }))
            }
            ConversionError::Timeout { timeout_seconds } => AppError::timeout(err.to_string())
                .with_code(code)
                .with_details(serde_json::json!({ "timeout_seconds": timeout_seconds })),
            ConversionError::Launch { .. } => AppError::with_source(
                ErrorKind::ServiceUnavailable,
                "Model converter is unavailable",
                err,
            )
            .with_code(code),
            ConversionError::FileRelocation { ref file, .. } => {
                let message = format!("Failed to stage uploaded file '{file}'");
                AppError::with_source(ErrorKind::Internal, message, err).with_code(code)
            }
            ConversionError::DirectoryCreation { .. } => AppError::with_source(
                ErrorKind::Internal,
                "Failed to prepare the conversion workspace",
                err,
            )
            .with_code(code),
            ConversionError::OutputMissing { .. } => AppError::with_source(
                ErrorKind::Internal,
                "Converter produced no output file",
                err,
            )
            .with_code(code),
            ConversionError::Io(_) => AppError::with_source(
                ErrorKind::Internal,
                "Conversion failed on the server",
                err,
            )
            .with_code(code),
        }
    }
}
