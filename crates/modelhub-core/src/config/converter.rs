//! Configuration for the model conversion subsystem.
//!
//! The external converter is located per operating system family under
//! `tool_root` unless `tool_path` names the executable explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration for the Assimp-based model converter.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Directory holding the per-platform converter binaries
    /// (`win32/assimp.exe`, `osx/assimp`, `linux/assimp`).
    pub tool_root: PathBuf,

    /// Explicit converter executable. Empty means platform resolution
    /// under `tool_root`.
    pub tool_path: PathBuf,

    /// Directory receiving uploaded files. Staging directories are
    /// created next to the uploads.
    pub upload_dir: PathBuf,

    /// Output extension used when the request names none or an unknown one.
    pub default_output: String,

    /// Wall-clock limit for a single converter invocation.
    #[validate(range(min = 1, max = 7200))]
    pub timeout_seconds: u64,

    /// Maximum number of converter processes running at once.
    #[validate(range(min = 1, max = 64))]
    pub max_concurrent_conversions: usize,

    /// Upper bound on retained stdout/stderr text per stream.
    #[validate(range(min = 1024))]
    pub max_diagnostic_bytes: usize,

    /// Whether staging directories are removed once a request finishes.
    pub cleanup_staging: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            tool_root: PathBuf::from("bin"),
            tool_path: PathBuf::new(),
            upload_dir: default_upload_dir(),
            default_output: "mesh".to_string(),
            timeout_seconds: 300,
            max_concurrent_conversions: 4,
            max_diagnostic_bytes: 64 * 1024,
            cleanup_staging: true,
        }
    }
}

impl ConverterConfig {
    /// Anchor relative paths to the current directory.
    ///
    /// The converter runs inside a per-job directory, so every path handed
    /// to it must stay valid after the change of directory. A bare
    /// `tool_path` such as `assimp` is left alone and resolved through
    /// `PATH`.
    pub fn absolutize_paths(&mut self) -> std::io::Result<()> {
        self.upload_dir = std::path::absolute(&self.upload_dir)?;
        self.tool_root = std::path::absolute(&self.tool_root)?;
        if is_path_like(&self.tool_path) {
            self.tool_path = std::path::absolute(&self.tool_path)?;
        }
        Ok(())
    }
}

/// Whether `path` names a location rather than a bare program name.
pub fn is_path_like(path: &Path) -> bool {
    path.components().count() > 1 || path.is_absolute()
}

fn default_upload_dir() -> PathBuf {
    std::env::temp_dir().join("modelhub").join("uploads")
}
