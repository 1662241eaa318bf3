//! Staging: validates a request and moves its uploads into a per-job
//! working directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ConversionError;
use crate::formats::FormatDescriptor;
use crate::models::{ConversionRequest, StagedJob};
use crate::options;

/// Creates isolated working directories and relocates uploads into them.
#[derive(Debug, Clone, Default)]
pub struct Stager;

impl Stager {
    /// Create a new stager.
    pub fn new() -> Self {
        Self
    }

    /// Validate `request` and stage its files for conversion to `output_format`.
    ///
    /// Exactly one upload must be a model file. Every upload, model or not,
    /// is moved into the working directory under its original name, and two
    /// uploads with the same name are a relocation error. Names are checked
    /// before the directory is created. The first failed move aborts
    /// staging; files already moved stay where they are and the error names
    /// the directory holding them.
    pub async fn stage(
        &self,
        request: &ConversionRequest,
        output_format: FormatDescriptor,
    ) -> Result<StagedJob, ConversionError> {
        let model_index = match request.model_file_indices().as_slice() {
            [] => return Err(ConversionError::NoModelFile),
            [index] => *index,
            many => {
                return Err(ConversionError::MultipleModelFiles { count: many.len() });
            }
        };

        // Every name is checked before anything touches the filesystem.
        let names = request
            .uploaded_files
            .iter()
            .map(|file| {
                Self::safe_file_name(&file.original_name).ok_or_else(|| {
                    ConversionError::FileRelocation {
                        file: file.original_name.clone(),
                        working_directory: None,
                        source: invalid_name_error(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let model = &request.uploaded_files[model_index];
        let model_name = &names[model_index];

        let working_directory = Self::working_directory_for(&model.temp_path);
        let working_directory = std::path::absolute(&working_directory).map_err(|source| {
            ConversionError::DirectoryCreation {
                path: working_directory.clone(),
                source,
            }
        })?;

        info!(
            dir = %working_directory.display(),
            model = %model_name,
            files = request.uploaded_files.len(),
            "Creating working directory"
        );

        tokio::fs::create_dir(&working_directory)
            .await
            .map_err(|source| ConversionError::DirectoryCreation {
                path: working_directory.clone(),
                source,
            })?;

        for (index, (file, name)) in request.uploaded_files.iter().zip(&names).enumerate() {
            let destination = working_directory.join(name);

            debug!(
                index,
                from = %file.temp_path.display(),
                to = %destination.display(),
                "Moving upload"
            );

            relocate(&file.temp_path, &destination)
                .await
                .map_err(|source| ConversionError::FileRelocation {
                    file: file.original_name.clone(),
                    working_directory: Some(working_directory.clone()),
                    source,
                })?;
        }

        let output_name = output_file_name(model_name, output_format);

        Ok(StagedJob {
            input_path: working_directory.join(model_name),
            output_path: working_directory.join(output_name),
            working_directory,
            output_format,
            arguments: options::switches_for(&request.flags),
        })
    }

    /// Working directory for a job whose model was uploaded to `temp_path`.
    ///
    /// The directory sits next to the upload and is named after the upload's
    /// stem, so it is unique whenever upload names are.
    pub fn working_directory_for(temp_path: &Path) -> PathBuf {
        let parent = temp_path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = temp_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        match temp_path.file_stem() {
            Some(stem) if temp_path.extension().is_some() => parent.join(stem),
            _ => parent.join(format!("{file_name}_job")),
        }
    }

    /// Final path component of a client-supplied name.
    ///
    /// Strips any directory part, whichever separator the client used.
    pub fn safe_file_name(original_name: &str) -> Option<String> {
        let name = original_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(original_name)
            .trim();

        if name.is_empty() || name == "." || name == ".." {
            None
        } else {
            Some(name.to_string())
        }
    }
}

/// Output file name for `model_name`, never equal to the model's own name.
fn output_file_name(model_name: &str, output_format: FormatDescriptor) -> String {
    let stem = Path::new(model_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(model_name);
    let name = format!("{}.{}", stem, output_format.extension);
    if name.eq_ignore_ascii_case(model_name) {
        format!("{}_converted.{}", stem, output_format.extension)
    } else {
        name
    }
}

/// Move a file, falling back to copy + delete across filesystems.
///
/// An existing destination is never replaced.
async fn relocate(from: &Path, to: &Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(to).await? {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already staged", to.display()),
        ));
    }
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
        Err(e) => Err(e),
    }
}

fn is_cross_device(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::CrossesDevices
}

fn invalid_name_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, "file name is empty")
}
