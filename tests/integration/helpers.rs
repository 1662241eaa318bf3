//! Shared test helpers for integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use modelhub_converter::{
    ConversionRunner, ProcessError, ProcessInvocation, ProcessOutput, ProcessRunner,
    RequestOrchestrator, formats,
};
use modelhub_core::config::AppConfig;

pub const BOUNDARY: &str = "modelhub-test-boundary";

/// How the fake converter behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterBehavior {
    /// Exit 0 and write `converted:<input bytes>` to the output path.
    Succeed,
    /// Exit with the given code and a diagnostic on stderr.
    Fail(i32),
    /// Exit 0 without writing anything.
    NoOutput,
    /// The executable cannot be started.
    Missing,
    /// The process exceeds its timeout.
    Hang,
}

/// In-process stand-in for the Assimp executable.
#[derive(Debug)]
pub struct FakeConverter {
    behavior: ConverterBehavior,
    invocations: Mutex<Vec<ProcessInvocation>>,
}

impl FakeConverter {
    pub fn new(behavior: ConverterBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            invocations: Mutex::new(Vec::new()),
        })
    }

    /// Invocations seen so far.
    pub fn invocations(&self) -> Vec<ProcessInvocation> {
        self.invocations.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ProcessRunner for FakeConverter {
    async fn run(&self, invocation: &ProcessInvocation) -> Result<ProcessOutput, ProcessError> {
        self.invocations
            .lock()
            .expect("lock")
            .push(invocation.clone());

        let exited = |code: i32, stderr: &str| ProcessOutput {
            exit_code: Some(code),
            stdout: "Launching asset import ...\n".to_string(),
            stderr: stderr.to_string(),
            duration: Duration::from_millis(3),
        };

        match self.behavior {
            ConverterBehavior::Succeed => {
                let input = tokio::fs::read(&invocation.args[1]).await?;
                let mut output = b"converted:".to_vec();
                output.extend_from_slice(&input);
                tokio::fs::write(&invocation.args[2], output).await?;
                Ok(exited(0, ""))
            }
            ConverterBehavior::Fail(code) => Ok(exited(code, "ERROR: Failed to load file\n")),
            ConverterBehavior::NoOutput => Ok(exited(0, "")),
            ConverterBehavior::Missing => Err(ProcessError::Launch {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
            ConverterBehavior::Hang => Err(ProcessError::Timeout(invocation.timeout)),
        }
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The fake converter behind the router
    pub converter: Arc<FakeConverter>,
    /// Upload directory; removed when the app is dropped
    pub upload_dir: TempDir,
}

impl TestApp {
    /// Create a new test application whose converter behaves as given
    pub fn new(behavior: ConverterBehavior) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");

        let mut config = AppConfig::default();
        config.converter.upload_dir = upload_dir.path().to_path_buf();

        let converter = FakeConverter::new(behavior);
        let runner = ConversionRunner::new(
            PathBuf::from("assimp"),
            Duration::from_secs(config.converter.timeout_seconds),
            converter.clone(),
        );
        let orchestrator = RequestOrchestrator::new(
            runner,
            formats::describe_output(formats::DEFAULT_OUTPUT_EXTENSION).expect("default output"),
            config.converter.max_concurrent_conversions,
            config.converter.cleanup_staging,
        );

        let state = modelhub_api::AppState::new(config, orchestrator);
        let router = modelhub_api::build_app(state);

        Self {
            router,
            converter,
            upload_dir,
        }
    }

    /// Entries left in the upload directory
    pub fn leftover_uploads(&self) -> Vec<PathBuf> {
        list_dir(self.upload_dir.path())
    }

    /// Make a GET request to the test app
    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(req).await
    }

    /// POST a multipart form to the test app
    pub async fn post_form(&self, path: &str, form: MultipartForm) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(form.finish()))
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body")
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

fn list_dir(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Body parsed as JSON, `Null` if it is not JSON
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// Body as lossy UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Minimal `multipart/form-data` body builder
#[derive(Debug, Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file part
    pub fn file(mut self, field: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Add a text part
    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}
