//! HTML to PDF conversion.
//!
//! Callers depend only on [`PdfGenerator`]; which backend sits behind it is
//! decided once, at startup, by [`build_generator`].
//!
//! # Module Structure
//!
//! - [`chromium`] - Headless Chromium driven over CDP, one shared tab
//! - [`gotenberg`] - Multipart client for a Gotenberg-compatible service
//! - [`scripts`] - In-page readiness probe
//!
//! # Example
//!
//! ```no_run
//! use paperboy_lib::{ConversionOptions, GotenbergPdfGenerator, PdfGenerator};
//!
//! # async fn example() -> paperboy_lib::Result<()> {
//! let generator = GotenbergPdfGenerator::new("http://localhost:3000")?;
//! let pdf = generator
//!     .generate_pdf("<h1>Invoice</h1>", &ConversionOptions::default())
//!     .await?;
//! std::fs::write("invoice.pdf", pdf)?;
//! # Ok(())
//! # }
//! ```

mod chromium;
mod gotenberg;
mod scripts;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{PdfBackend, PdfConfig};
use crate::{ConversionOptions, Result};

pub use chromium::{BrowserSession, CdpPage, ChromiumPdfGenerator, PageDriver, PrintSettings};
pub use gotenberg::{GotenbergPdfGenerator, CONVERT_HTML_PATH, DEFAULT_TIMEOUT};

/// Turns a fully rendered HTML document into PDF bytes.
///
/// Implementations are safe to call concurrently and never modify `options`.
/// Any error means the conversion failed; nothing is retried.
#[async_trait]
pub trait PdfGenerator: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn generate_pdf(&self, html: &str, options: &ConversionOptions) -> Result<Vec<u8>>;

    /// Releases backend resources. No conversion may be started afterwards.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Constructs the configured backend.
pub async fn build_generator(config: &PdfConfig) -> Result<Arc<dyn PdfGenerator>> {
    let generator: Arc<dyn PdfGenerator> = match config.backend {
        PdfBackend::Gotenberg => Arc::new(GotenbergPdfGenerator::new(&config.gotenberg.url)?),
        PdfBackend::Chromium => Arc::new(ChromiumPdfGenerator::launch(&config.chromium).await?),
    };
    info!(backend = generator.name(), "pdf backend ready");
    Ok(generator)
}
