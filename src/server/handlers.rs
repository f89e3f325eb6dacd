use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, INVALID_JSON_BODY};
use super::AppState;
use crate::templates::{Template, TemplateData, TemplateSummary};
use crate::ConversionOptions;

#[derive(Debug, Deserialize)]
pub struct RenderHtmlRequest {
    pub template: String,
    #[serde(default)]
    pub data: Option<TemplateData>,
}

#[derive(Debug, Deserialize)]
pub struct RenderPdfRequest {
    pub template: String,
    #[serde(default)]
    pub data: Option<TemplateData>,
    #[serde(default)]
    pub options: Option<ConversionOptions>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateSummary>>, ApiError> {
    Ok(Json(state.templates.list().await?))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Template>, ApiError> {
    Ok(Json(state.templates.get(&name).await?))
}

pub async fn render_html(
    State(state): State<AppState>,
    payload: Result<Json<RenderHtmlRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    require_template(&request.template)?;

    let data = request.data.unwrap_or_default();
    let html = state.templates.render_html(&request.template, &data).await?;

    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html))
}

pub async fn render_pdf(
    State(state): State<AppState>,
    payload: Result<Json<RenderPdfRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    require_template(&request.template)?;

    let data = request.data.unwrap_or_default();
    let options = request.options.unwrap_or_default();
    let pdf = state
        .templates
        .render_pdf(&request.template, &data, &options)
        .await?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], pdf))
}

fn require_template(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request(INVALID_JSON_BODY));
    }
    Ok(())
}
