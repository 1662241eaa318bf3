//! Domain models: uploaded files, requests, staged jobs, and results.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::formats::{self, FormatDescriptor};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A file received with the request and written to a temporary location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name the client gave the file.
    pub original_name: String,
    /// Where the upload currently lives; its file name is unique per upload.
    pub temp_path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

impl UploadedFile {
    /// Returns `true` if this upload carries an importable extension.
    pub fn is_model_file(&self) -> bool {
        formats::is_model_file(&self.original_name)
    }
}

/// Everything the pipeline needs from one incoming conversion request.
#[derive(Debug, Clone, Default)]
pub struct ConversionRequest {
    /// Uploaded files in submission order.
    pub uploaded_files: Vec<UploadedFile>,
    /// Requested output extension, if any.
    pub output_extension: Option<String>,
    /// Option flags keyed by form name.
    pub flags: BTreeMap<String, bool>,
}

impl ConversionRequest {
    /// Indices of uploaded files with an importable extension.
    pub fn model_file_indices(&self) -> Vec<usize> {
        self.uploaded_files
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_model_file())
            .map(|(i, _)| i)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Staged job
// ---------------------------------------------------------------------------

/// A request whose files have been moved into an isolated working directory.
#[derive(Debug, Clone)]
pub struct StagedJob {
    /// Per-job working directory.
    pub working_directory: PathBuf,
    /// Model file inside the working directory.
    pub input_path: PathBuf,
    /// Where the converter writes its result.
    pub output_path: PathBuf,
    /// Resolved output format.
    pub output_format: FormatDescriptor,
    /// Converter switches derived from the request flags.
    pub arguments: Vec<String>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of a converter process that exited with status zero.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Path of the converted file.
    pub output_path: PathBuf,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall-clock time spent in the converter.
    pub duration: Duration,
}

/// A converted file ready to be sent back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct FileResponse {
    /// Absolute path of the converted file.
    pub path: PathBuf,
    /// File name to present to the client.
    pub file_name: String,
    /// MIME type for the output format.
    pub content_type: &'static str,
    /// Output format metadata.
    pub output_format: FormatDescriptor,
    /// Working directory to release once the file has been sent.
    #[serde(skip)]
    pub working_directory: PathBuf,
}
