use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use mgen_api::{create_router, ApiConfig, AppState};
use mgen_codegen::{CodegenResult, ScriptSource, StaticIssueDetector};
use mgen_models::{GeneratedSource, GenerationRequest, ReasonCategory, RenderOutcome, TargetProfile};
use mgen_render::{RenderResult, Renderer};
use mgen_storage::{BlobStore, LocalBlobStore};
use mgen_store::{InMemoryAccountStore, InMemoryVideoStore};
use mgen_worker::{RecoveryLoop, VideoProcessor, WorkerConfig};

const SCRIPT: &str = "from manim import *\n\nclass DrawCircle(Scene):\n    def construct(self):\n        self.play(Create(Circle()))\n";

struct FixedSource;

#[async_trait]
impl ScriptSource for FixedSource {
    async fn generate(&self, _request: &GenerationRequest) -> CodegenResult<GeneratedSource> {
        Ok(GeneratedSource::new(SCRIPT, "DrawCircle"))
    }
}

/// Writes a small artifact and reports success.
struct WritingRenderer;

#[async_trait]
impl Renderer for WritingRenderer {
    async fn render(&self, _source: &str, output_dir: &Path) -> RenderResult<RenderOutcome> {
        tokio::fs::create_dir_all(output_dir).await?;
        let artifact = output_dir.join("DrawCircle.mp4");
        tokio::fs::write(&artifact, b"fake video").await?;
        Ok(RenderOutcome::success(artifact))
    }
}

/// Fails every render with the same retryable error.
struct FailingRenderer;

#[async_trait]
impl Renderer for FailingRenderer {
    async fn render(&self, _source: &str, _output_dir: &Path) -> RenderResult<RenderOutcome> {
        Ok(RenderOutcome::retryable(
            ReasonCategory::UndefinedName,
            "NameError: name 'Circel' is not defined",
        ))
    }
}

struct TestApp {
    router: Router,
    _videos_dir: TempDir,
    _blob_dir: TempDir,
}

fn test_app(renderer: Arc<dyn Renderer>, with_blobs: bool) -> TestApp {
    let videos_dir = TempDir::new().unwrap();
    let blob_dir = TempDir::new().unwrap();

    let worker = WorkerConfig {
        videos_dir: videos_dir.path().to_path_buf(),
        ..WorkerConfig::default()
    };
    let recovery = RecoveryLoop::new(
        Arc::new(FixedSource),
        StaticIssueDetector::from_profile(&TargetProfile::default()),
        renderer,
    );
    let blobs: Option<Arc<dyn BlobStore>> = if with_blobs {
        Some(Arc::new(LocalBlobStore::new(blob_dir.path(), "https://cdn.example.com")))
    } else {
        None
    };

    let videos = Arc::new(InMemoryVideoStore::new());
    let processor = Arc::new(VideoProcessor::new(
        worker,
        Arc::new(recovery),
        videos.clone(),
        blobs,
    ));
    let state = AppState::new(
        ApiConfig::default(),
        Arc::new(InMemoryAccountStore::new().with_hash_rounds(1_000)),
        videos,
        processor,
    );

    TestApp {
        router: create_router(state, None),
        _videos_dir: videos_dir,
        _blob_dir: blob_dir,
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    Reply { status, headers, body }
}

async fn register(router: &Router, email: &str) -> String {
    let reply = send(
        router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"email": email, "password": "correct horse", "name": "Ada"})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.json()["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_healthy_with_security_headers() {
    let app = test_app(Arc::new(WritingRenderer), false);

    let reply = send(&app.router, Method::GET, "/health", None, None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["status"], "healthy");
    assert_eq!(reply.headers["x-content-type-options"], "nosniff");
    assert!(reply.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = test_app(Arc::new(WritingRenderer), false);
    register(&app.router, "ada@example.com").await;

    let duplicate = send(
        &app.router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"email": "ADA@example.com", "password": "another one"})),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let wrong = send(
        &app.router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "wrong password"})),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let login = send(
        &app.router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "correct horse"})),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.json()["access_token"].as_str().unwrap().to_string();

    let profile = send(&app.router, Method::GET, "/api/auth/profile", Some(&token), None).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.json()["email"], "ada@example.com");
    assert_eq!(profile.json()["name"], "Ada");
}

#[tokio::test]
async fn test_registration_rejects_invalid_input() {
    let app = test_app(Arc::new(WritingRenderer), false);

    let reply = send(
        &app.router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"email": "not-an-email", "password": "correct horse"})),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.json()["detail"].as_str().unwrap().starts_with("Validation error"));
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = test_app(Arc::new(WritingRenderer), false);

    let missing = send(&app.router, Method::GET, "/api/videos", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let forged = send(&app.router, Method::GET, "/api/videos", Some("not.a.token"), None).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_synchronous_generation_records_code_and_serves_local_file() {
    let app = test_app(Arc::new(WritingRenderer), false);
    let token = register(&app.router, "ada@example.com").await;

    let generated = send(
        &app.router,
        Method::POST,
        "/api/videos/generate",
        Some(&token),
        Some(json!({"prompt": "Draw a circle"})),
    )
    .await;
    assert_eq!(generated.status, StatusCode::OK);
    let body = generated.json();
    assert_eq!(body["status"], "completed");
    let id = body["video_id"].as_str().unwrap().to_string();
    assert_eq!(body["video_url"], format!("/api/videos/{}/file", id));

    let code = send(&app.router, Method::GET, &format!("/api/videos/{}/code", id), Some(&token), None).await;
    assert_eq!(code.status, StatusCode::OK);
    assert_eq!(code.json()["code"], SCRIPT);

    let file = send(&app.router, Method::GET, &format!("/api/videos/{}/file", id), Some(&token), None).await;
    assert_eq!(file.status, StatusCode::OK);
    assert_eq!(file.headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(file.body, b"fake video");

    let listing = send(&app.router, Method::GET, "/api/videos?page=1&per_page=5", Some(&token), None).await;
    assert_eq!(listing.status, StatusCode::OK);
    assert_eq!(listing.json()["total"], 1);
    assert_eq!(listing.json()["videos"][0]["id"], id.as_str());
}

#[tokio::test]
async fn test_uploaded_video_redirects_to_blob_url() {
    let app = test_app(Arc::new(WritingRenderer), true);
    let token = register(&app.router, "ada@example.com").await;

    let generated = send(
        &app.router,
        Method::POST,
        "/api/videos/generate",
        Some(&token),
        Some(json!({"prompt": "Draw a circle"})),
    )
    .await;
    let id = generated.json()["video_id"].as_str().unwrap().to_string();

    let file = send(&app.router, Method::GET, &format!("/api/videos/{}/file", id), Some(&token), None).await;
    assert_eq!(file.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        file.headers[header::LOCATION],
        format!("https://cdn.example.com/videos/{}.mp4", id).as_str()
    );
}

#[tokio::test]
async fn test_exhausted_generation_reports_last_error() {
    let app = test_app(Arc::new(FailingRenderer), false);
    let token = register(&app.router, "ada@example.com").await;

    let reply = send(
        &app.router,
        Method::POST,
        "/api/videos/generate",
        Some(&token),
        Some(json!({"prompt": "Draw a circle"})),
    )
    .await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.json()["detail"],
        "Failed to render video after 3 attempts. Last error: NameError: name 'Circel' is not defined"
    );

    let listing = send(&app.router, Method::GET, "/api/videos", Some(&token), None).await;
    let record = &listing.json()["videos"][0];
    assert_eq!(record["status"], "failed");
    assert_eq!(record["attempts"], 3);

    let file = send(
        &app.router,
        Method::GET,
        &format!("/api/videos/{}/file", record["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(file.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submitted_video_completes_in_background() {
    let app = test_app(Arc::new(WritingRenderer), false);
    let token = register(&app.router, "ada@example.com").await;

    let accepted = send(
        &app.router,
        Method::POST,
        "/api/videos",
        Some(&token),
        Some(json!({"prompt": "Draw a circle"})),
    )
    .await;
    assert_eq!(accepted.status, StatusCode::ACCEPTED);
    assert_eq!(accepted.json()["status"], "pending");
    let id = accepted.json()["video_id"].as_str().unwrap().to_string();

    let mut status = String::new();
    for _ in 0..100 {
        let reply = send(&app.router, Method::GET, &format!("/api/videos/{}", id), Some(&token), None).await;
        status = reply.json()["status"].as_str().unwrap().to_string();
        if status == "completed" || status == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, "completed");
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let app = test_app(Arc::new(WritingRenderer), false);
    let token = register(&app.router, "ada@example.com").await;

    let reply = send(
        &app.router,
        Method::POST,
        "/api/videos",
        Some(&token),
        Some(json!({"prompt": ""})),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_videos_are_private_to_their_owner() {
    let app = test_app(Arc::new(WritingRenderer), false);
    let owner = register(&app.router, "ada@example.com").await;
    let other = register(&app.router, "grace@example.com").await;

    let generated = send(
        &app.router,
        Method::POST,
        "/api/videos/generate",
        Some(&owner),
        Some(json!({"prompt": "Draw a circle"})),
    )
    .await;
    let id = generated.json()["video_id"].as_str().unwrap().to_string();

    let reply = send(&app.router, Method::GET, &format!("/api/videos/{}", id), Some(&other), None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let missing = send(&app.router, Method::GET, "/api/videos/does-not-exist", Some(&other), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
