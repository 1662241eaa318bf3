//! Integration tests for format discovery and health.

use http::StatusCode;

use crate::helpers::{ConverterBehavior, TestApp};

#[tokio::test]
async fn test_list_formats() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let response = app.get("/api/formats").await;
    assert_eq!(response.status, StatusCode::OK);

    let data = &response.json()["data"];
    assert_eq!(data["default_output"], "mesh");

    let inputs = data["input_formats"].as_array().expect("input formats");
    assert!(inputs.iter().any(|f| f["extension"] == "obj" && f["direction"] == "input"));

    let outputs = data["output_formats"].as_array().expect("output formats");
    assert!(outputs.iter().any(|f| f["extension"] == "mesh" && f["direction"] == "output"));

    let options = data["options"].as_array().expect("options");
    assert_eq!(options.len(), 25);
    assert_eq!(options[0]["name"], "pretransformNormals");
    assert!(
        options
            .iter()
            .any(|o| o["name"] == "fixNormals" && o["switch"] == "--fix-normals")
    );
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let response = app.get("/api/health").await;
    assert_eq!(response.status, StatusCode::OK);

    let data = &response.json()["data"];
    assert_eq!(data["status"], "ok");
    assert_eq!(data["converter_available"], false);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new(ConverterBehavior::Succeed);

    let response = app.get("/api/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
