//! Response DTOs.

use serde::Serialize;

use modelhub_converter::FormatDescriptor;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Whether the configured converter executable exists on disk.
    pub converter_available: bool,
}

/// Supported formats and conversion options.
#[derive(Debug, Clone, Serialize)]
pub struct FormatsResponse {
    /// Importable formats.
    pub input_formats: Vec<FormatDescriptor>,
    /// Exportable formats.
    pub output_formats: Vec<FormatDescriptor>,
    /// Output extension used when a request names none or an unknown one.
    pub default_output: &'static str,
    /// Form field names accepted as option flags, in switch order.
    pub options: Vec<OptionDescriptor>,
}

/// One option flag and the converter switch it enables.
#[derive(Debug, Clone, Serialize)]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub switch: &'static str,
}
