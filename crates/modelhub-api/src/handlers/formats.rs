//! Format listing handler.

use axum::Json;
use axum::extract::State;

use modelhub_converter::formats;
use modelhub_converter::options::OPTION_SWITCHES;

use crate::dto::response::{ApiResponse, FormatsResponse, OptionDescriptor};
use crate::state::AppState;

/// GET /api/formats
pub async fn list_formats(State(state): State<AppState>) -> Json<ApiResponse<FormatsResponse>> {
    Json(ApiResponse::ok(FormatsResponse {
        input_formats: formats::input_formats().to_vec(),
        output_formats: formats::output_formats().to_vec(),
        default_output: state.orchestrator.default_output().extension,
        options: OPTION_SWITCHES
            .iter()
            .map(|&(name, switch)| OptionDescriptor { name, switch })
            .collect(),
    }))
}
