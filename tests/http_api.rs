use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use paperboy_lib::server::{self, AppState};
use paperboy_lib::{ConversionOptions, PaperboyError, PdfGenerator, Result, TemplateService};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Default)]
struct FakeGenerator {
    fail: bool,
    closed: AtomicBool,
    calls: Mutex<Vec<(String, ConversionOptions)>>,
}

#[async_trait]
impl PdfGenerator for FakeGenerator {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn generate_pdf(&self, html: &str, options: &ConversionOptions) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((html.to_string(), options.clone()));
        if self.fail {
            return Err(PaperboyError::conversion(
                reqwest::StatusCode::BAD_GATEWAY,
                "upstream exploded",
            ));
        }
        Ok(format!("%PDF-1.7\n{html}").into_bytes())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct TestApp {
    _dir: TempDir,
    router: Router,
    generator: Arc<FakeGenerator>,
}

fn app_with(generator: FakeGenerator) -> TestApp {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("greeting.html"),
        "<h1>Hello {{ name }}</h1>",
    )
    .unwrap();
    std::fs::write(dir.path().join("static.html"), "<p>No data needed</p>").unwrap();
    std::fs::write(dir.path().join("broken.html"), "{% for %}").unwrap();
    std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

    let generator = Arc::new(generator);
    let service = TemplateService::new(dir.path()).with_generator(generator.clone());
    TestApp {
        router: server::router(AppState::new(service)),
        _dir: dir,
        generator,
    }
}

fn app() -> TestApp {
    app_with(FakeGenerator::default())
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let response = send(&app.router, get("/api/v1/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn lists_templates_with_and_without_trailing_slash() {
    let app = app();
    for uri in ["/api/v1/templates", "/api/v1/templates/"] {
        let response = send(&app.router, get(uri)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(
            body_json(response).await,
            json!([
                {"name": "broken.html"},
                {"name": "greeting.html"},
                {"name": "static.html"}
            ])
        );
    }
}

#[tokio::test]
async fn listing_missing_directory_is_generic_500() {
    let router = server::router(AppState::new(TemplateService::new(
        "/definitely/not/a/template/dir",
    )));
    let response = send(&router, get("/api/v1/templates")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"message": "Some error occurred, please try again"})
    );
}

#[tokio::test]
async fn gets_template_source() {
    let app = app();
    let response = send(&app.router, get("/api/v1/templates/greeting.html")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "greeting.html");
    assert!(body["content"].as_str().unwrap().contains("{{ name"));
}

#[tokio::test]
async fn unknown_template_is_404() {
    let app = app();
    let response = send(&app.router, get("/api/v1/templates/missing.html")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"message": "Template with name missing.html not found"})
    );
}

#[tokio::test]
async fn renders_html() {
    let app = app();
    let response = send(
        &app.router,
        post_json(
            "/api/v1/templates/html",
            r#"{"template": "greeting.html", "data": {"name": "Ada"}}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/html; charset=utf-8");
    assert_eq!(body_bytes(response).await, b"<h1>Hello Ada</h1>");
}

#[tokio::test]
async fn renders_html_without_data() {
    let app = app();
    let response = send(
        &app.router,
        post_json("/api/v1/templates/html", r#"{"template": "static.html"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"<p>No data needed</p>");
}

#[tokio::test]
async fn malformed_or_incomplete_bodies_are_400() {
    let app = app();
    for body in [
        "{not json",
        r#"{"data": {}}"#,
        r#"{"template": ""}"#,
        r#"{"template": "greeting.html", "data": [1, 2]}"#,
    ] {
        let response = send(&app.router, post_json("/api/v1/templates/html", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(
            body_json(response).await,
            json!({"message": "Invalid JSON body"})
        );
    }
}

#[tokio::test]
async fn missing_content_type_is_400() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/templates/pdf")
        .body(Body::from(r#"{"template": "greeting.html"}"#))
        .unwrap();

    let response = send(&app.router, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn render_failure_is_500() {
    let app = app();
    let response = send(
        &app.router,
        post_json("/api/v1/templates/html", r#"{"template": "broken.html"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"message": "Failed to render template"})
    );
}

#[tokio::test]
async fn renders_pdf_with_options() {
    let app = app();
    let response = send(
        &app.router,
        post_json(
            "/api/v1/templates/pdf",
            r#"{"template": "greeting.html", "data": {"name": "Grace"}, "options": {"landscape": true, "waitDelay": "250ms"}}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/pdf");
    let pdf = body_bytes(response).await;
    assert!(pdf.starts_with(b"%PDF-"));

    let calls = app.generator.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (html, options) = &calls[0];
    assert_eq!(html, "<h1>Hello Grace</h1>");
    assert!(options.landscape);
    assert_eq!(options.wait_delay.as_deref(), Some("250ms"));
    assert_eq!(options.paper_width, 8.5);
    assert_eq!(options.paper_height, 11.0);
    assert_eq!(options.margin_left, 0.5);
    assert!(options.print_background);
}

#[tokio::test]
async fn pdf_without_options_uses_defaults() {
    let app = app();
    let response = send(
        &app.router,
        post_json(
            "/api/v1/templates/pdf",
            r#"{"template": "static.html", "options": null}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let calls = app.generator.calls.lock().unwrap();
    assert_eq!(calls[0].1, ConversionOptions::default());
}

#[tokio::test]
async fn invalid_options_are_400_and_skip_conversion() {
    let app = app();
    let response = send(
        &app.router,
        post_json(
            "/api/v1/templates/pdf",
            r#"{"template": "greeting.html", "options": {"marginTop": -1}}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("marginTop"));
    assert!(app.generator.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn pdf_for_unknown_template_is_404() {
    let app = app();
    let response = send(
        &app.router,
        post_json("/api/v1/templates/pdf", r#"{"template": "nope.html"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.generator.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn backend_failure_is_500() {
    let app = app_with(FakeGenerator {
        fail: true,
        ..FakeGenerator::default()
    });
    let response = send(
        &app.router,
        post_json("/api/v1/templates/pdf", r#"{"template": "static.html"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"message": "Failed to generate PDF"})
    );
}

#[tokio::test]
async fn run_serves_until_shutdown_then_closes_backend() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(FakeGenerator::default());
    let service = TemplateService::new(dir.path()).with_generator(generator.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(server::run(listener, AppState::new(service), async move {
        let _ = stop_rx.await;
    }));

    let body: Value = reqwest::get(format!("http://{addr}/api/v1/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(!generator.closed.load(Ordering::SeqCst));

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
    assert!(generator.closed.load(Ordering::SeqCst));
}
