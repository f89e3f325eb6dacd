//! Paperboy Library
//!
//! Renders Liquid HTML templates and converts the result to PDF, either
//! through a local headless Chromium or a remote Gotenberg-compatible
//! service. The same pieces back the `paperboy` HTTP API and CLI.
//!
//! # Module Overview
//!
//! - [`pdfgen`] - The [`PdfGenerator`] port and its two backends
//! - [`options`] - Page geometry and wait options for one conversion
//! - [`templates`] - Template directory listing and Liquid rendering
//! - [`server`] - axum routes under `/api/v1`
//! - [`config`] - TOML configuration with environment overrides
//! - [`telemetry`] - tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use paperboy_lib::{ConversionOptions, GotenbergPdfGenerator, TemplateService};
//!
//! # async fn example() -> paperboy_lib::Result<()> {
//! let generator = Arc::new(GotenbergPdfGenerator::new("http://localhost:3000")?);
//! let service = TemplateService::new("./templates").with_generator(generator);
//!
//! let data = serde_json::json!({ "customer": "ACME" });
//! let data = data.as_object().cloned().unwrap_or_default();
//! let pdf = service
//!     .render_pdf("invoice.html", &data, &ConversionOptions::default())
//!     .await?;
//! # let _ = pdf;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod options;
pub mod pdfgen;
pub mod server;
pub mod telemetry;
pub mod templates;

pub use config::{Config, PdfBackend};
pub use error::{ErrorCategory, ErrorPayload, PaperboyError, Result};
pub use options::ConversionOptions;
pub use pdfgen::{
    build_generator, ChromiumPdfGenerator, GotenbergPdfGenerator, PageDriver, PdfGenerator,
    PrintSettings,
};
pub use server::AppState;
pub use templates::{Template, TemplateData, TemplateService, TemplateSummary};
