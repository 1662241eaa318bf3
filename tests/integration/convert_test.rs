//! Integration tests for the conversion endpoint.

use http::StatusCode;

use crate::helpers::{ConverterBehavior, MultipartForm, TestApp};

const CHAIR_OBJ: &[u8] = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

#[tokio::test]
async fn test_convert_defaults_to_mesh() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let form = MultipartForm::new().file("model", "chair.obj", CHAIR_OBJ);
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        Some("application/octet-stream")
    );
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=\"chair.mesh\"")
    );

    let mut expected = b"converted:".to_vec();
    expected.extend_from_slice(CHAIR_OBJ);
    assert_eq!(response.body, expected);

    let invocations = app.converter.invocations();
    assert_eq!(invocations.len(), 1);
    let args = &invocations[0].args;
    assert_eq!(args.len(), 3);
    assert_eq!(args[0], "export");
    assert!(args[1].ends_with("chair.obj"));
    assert!(args[2].ends_with("chair.mesh"));

    // Staging directory released, upload consumed.
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_convert_with_output_flags_and_texture() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let form = MultipartForm::new()
        .file("model", "chair.obj", CHAIR_OBJ)
        .file("model", "chair.png", b"\x89PNG")
        .text("output", "stl")
        .text("triangulate", "on")
        .text("genSmoothNormals", "on")
        .text("flipUVCoords", "off");
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("model/stl"));
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=\"chair.stl\"")
    );

    let invocations = app.converter.invocations();
    assert_eq!(
        &invocations[0].args[3..],
        ["--gen-smooth-normals", "--triangulate"]
    );
    assert_eq!(
        invocations[0].working_dir,
        std::path::PathBuf::from(&invocations[0].args[1])
            .parent()
            .expect("parent")
    );
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_unknown_output_falls_back_to_default() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let form = MultipartForm::new()
        .file("model", "duck.dae", b"<COLLADA/>")
        .text("output", "fbx");
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=\"duck.mesh\"")
    );
}

#[tokio::test]
async fn test_no_files_is_rejected() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let form = MultipartForm::new().text("output", "obj");
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "NO_FILES");
    assert!(app.converter.invocations().is_empty());
}

#[tokio::test]
async fn test_no_model_file_is_rejected() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let form = MultipartForm::new().file("model", "chair.png", b"\x89PNG");
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "NO_MODEL_FILE");
    assert!(app.converter.invocations().is_empty());
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_multiple_model_files_are_rejected() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let form = MultipartForm::new()
        .file("model", "a.obj", CHAIR_OBJ)
        .file("model", "b.stl", b"solid b\nendsolid b\n");
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["error"], "MULTIPLE_MODEL_FILES");
    assert!(app.converter.invocations().is_empty());
    // Neither a working directory nor the temporary uploads remain.
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_converter_failure_reports_stderr() {
    let app = TestApp::new(ConverterBehavior::Fail(1));

    let form = MultipartForm::new().file("model", "chair.obj", CHAIR_OBJ);
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json();
    assert_eq!(body["error"], "CONVERSION_FAILED");
    assert_eq!(body["details"]["exit_code"], 1);
    assert!(
        body["details"]["stderr"]
            .as_str()
            .is_some_and(|s| s.contains("Failed to load file"))
    );
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_missing_converter_is_unavailable() {
    let app = TestApp::new(ConverterBehavior::Missing);

    let form = MultipartForm::new().file("model", "chair.obj", CHAIR_OBJ);
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json();
    assert_eq!(body["error"], "CONVERTER_UNAVAILABLE");
    assert_eq!(body["message"], "Model converter is unavailable");
    assert!(!response.text().contains("assimp"));
}

#[tokio::test]
async fn test_timeout_maps_to_gateway_timeout() {
    let app = TestApp::new(ConverterBehavior::Hang);

    let form = MultipartForm::new().file("model", "chair.obj", CHAIR_OBJ);
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
    let body = response.json();
    assert_eq!(body["error"], "CONVERSION_TIMEOUT");
    assert_eq!(body["details"]["timeout_seconds"], 300);
}

#[tokio::test]
async fn test_missing_output_is_server_error() {
    let app = TestApp::new(ConverterBehavior::NoOutput);

    let form = MultipartForm::new().file("model", "chair.obj", CHAIR_OBJ);
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["error"], "OUTPUT_MISSING");
    let upload_dir = app.upload_dir.path().to_string_lossy().into_owned();
    assert!(!response.text().contains(&upload_dir));
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_duplicate_file_names_fail_and_leave_nothing_behind() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let form = MultipartForm::new()
        .file("model", "chair.obj", CHAIR_OBJ)
        .file("model", "tex.png", b"first")
        .file("model", "tex.png", b"second");
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json();
    assert_eq!(body["error"], "FILE_RELOCATION_FAILED");
    assert_eq!(body["message"], "Failed to stage uploaded file 'tex.png'");
    assert!(app.converter.invocations().is_empty());
    // Partial staging directory removed, unstaged upload discarded.
    assert!(app.leftover_uploads().is_empty());
}

#[tokio::test]
async fn test_same_format_output_keeps_input_intact() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let form = MultipartForm::new()
        .file("model", "chair.obj", CHAIR_OBJ)
        .text("output", "obj");
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=\"chair_converted.obj\"")
    );
    let mut expected = b"converted:".to_vec();
    expected.extend_from_slice(CHAIR_OBJ);
    assert_eq!(response.body, expected);
}

#[tokio::test]
async fn test_empty_file_part_is_ignored() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let form = MultipartForm::new()
        .file("model", "", b"")
        .file("model", "chair.obj", CHAIR_OBJ);
    let response = app.post_form("/api/convert", form).await;

    assert_eq!(response.status, StatusCode::OK);
}
