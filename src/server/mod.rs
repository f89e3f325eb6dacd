//! JSON API over the template service.

mod error;
mod handlers;

use std::future::Future;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::templates::TemplateService;
use crate::Result;

pub use error::{ApiError, ApiErrorBody};
pub use handlers::{RenderHtmlRequest, RenderPdfRequest};

pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct AppState {
    pub templates: TemplateService,
}

impl AppState {
    pub fn new(templates: TemplateService) -> Self {
        Self { templates }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/templates", get(handlers::list_templates))
        .route("/templates/", get(handlers::list_templates))
        .route("/templates/html", post(handlers::render_html))
        .route("/templates/pdf", post(handlers::render_pdf))
        .route("/templates/{name}", get(handlers::get_template));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Serves until `shutdown` resolves, then closes the PDF backend.
pub async fn run<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "listening");

    let generator = state.templates.generator().cloned();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("server stopped");
    if let Some(generator) = generator {
        generator.close().await?;
    }
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested");
}
