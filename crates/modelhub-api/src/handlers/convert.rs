//! Model conversion handler.

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use modelhub_converter::{ConversionRequest, FileResponse, UploadedFile, formats, options};
use modelhub_core::AppResult;
use modelhub_core::error::{AppError, ErrorKind};

use crate::state::AppState;

/// Multipart field carrying model and auxiliary files.
pub const MODEL_FIELD: &str = "model";
/// Multipart field naming the output extension.
pub const OUTPUT_FIELD: &str = "output";

/// POST /api/convert
///
/// Accepts one or more files under `model`, an optional `output`
/// extension, and option flags named after the converter options. Responds
/// with the converted file as an attachment.
pub async fn convert(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut request = ConversionRequest::default();

    let read = read_request(&mut multipart, &state.config.converter.upload_dir, &mut request).await;

    let outcome = match read {
        Ok(()) if request.uploaded_files.is_empty() => {
            Err(AppError::validation("No files present").with_code("NO_FILES"))
        }
        Ok(()) => convert_and_respond(&state, &request).await,
        Err(e) => Err(e),
    };

    // Uploads that were never staged are still in the upload directory.
    discard_uploads(&request.uploaded_files).await;

    outcome
}

async fn convert_and_respond(
    state: &AppState,
    request: &ConversionRequest,
) -> AppResult<Response> {
    info!(
        files = request.uploaded_files.len(),
        output = request.output_extension.as_deref().unwrap_or("-"),
        flags = request.flags.values().filter(|on| **on).count(),
        "Conversion requested"
    );

    let converted = state.orchestrator.handle(request).await?;

    let data = tokio::fs::read(&converted.path).await;
    state.orchestrator.release(&converted).await;
    let data = data.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read converted file: {e}"),
            e,
        )
    })?;

    file_response(&converted, data)
}

fn file_response(converted: &FileResponse, data: Vec<u8>) -> AppResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, converted.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                converted.file_name.replace(['"', '\\'], "_")
            ),
        )
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))
}

/// Read the multipart body into `request`, writing files to `upload_dir`.
///
/// Files are pushed onto `request` as soon as their temporary file exists,
/// so the caller can discard them even when reading fails part way.
async fn read_request(
    multipart: &mut Multipart,
    upload_dir: &Path,
    request: &mut ConversionRequest,
) -> AppResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            MODEL_FIELD => {
                let original_name = field.file_name().unwrap_or("").to_string();
                if original_name.is_empty() {
                    debug!("Skipping model part without a file name");
                    continue;
                }
                save_upload(field, original_name, upload_dir, request).await?;
            }
            OUTPUT_FIELD => {
                let text = read_text(field).await?;
                let text = text.trim();
                request.output_extension = (!text.is_empty()).then(|| text.to_string());
            }
            flag if options::is_option_name(flag) => {
                let text = read_text(field).await?;
                request
                    .flags
                    .insert(flag.to_string(), options::parse_flag_value(&text));
            }
            other => {
                debug!(field = other, "Ignoring unknown form field");
            }
        }
    }

    Ok(())
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::validation(format!("Read error: {e}")))
}

/// Stream one file part to a uniquely named temporary file.
async fn save_upload(
    mut field: Field<'_>,
    original_name: String,
    upload_dir: &Path,
    request: &mut ConversionRequest,
) -> AppResult<()> {
    let temp_path = temp_upload_path(upload_dir, &original_name);
    let mut file = tokio::fs::File::create(&temp_path).await?;

    request.uploaded_files.push(UploadedFile {
        original_name,
        temp_path,
        size: 0,
    });

    let mut size = 0u64;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::validation(format!("Read error: {e}")))?
    {
        size += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    if let Some(upload) = request.uploaded_files.last_mut() {
        upload.size = size;
        debug!(
            name = %upload.original_name,
            temp = %upload.temp_path.display(),
            size,
            "Upload received"
        );
    }

    Ok(())
}

/// `<upload_dir>/<uuid>.<ext>`, keeping the client's extension so that
/// staging can derive the working directory from the stem.
fn temp_upload_path(upload_dir: &Path, original_name: &str) -> PathBuf {
    let id = Uuid::new_v4().simple().to_string();
    let extension = formats::extension_of(original_name);
    let sanitized: String = extension
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if sanitized.is_empty() {
        upload_dir.join(id)
    } else {
        upload_dir.join(format!("{id}.{sanitized}"))
    }
}

async fn discard_uploads(uploads: &[UploadedFile]) {
    for upload in uploads {
        match tokio::fs::remove_file(&upload.temp_path).await {
            Ok(()) => debug!(path = %upload.temp_path.display(), "Removed unstaged upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %upload.temp_path.display(),
                error = %e,
                "Failed to remove upload"
            ),
        }
    }
}
