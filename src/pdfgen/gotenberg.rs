//! Remote backend: posts the HTML to a Gotenberg-compatible conversion service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use super::PdfGenerator;
use crate::{ConversionOptions, PaperboyError, Result};

/// Path of the HTML conversion route, relative to the service base URL.
pub const CONVERT_HTML_PATH: &str = "/forms/chromium/convert/html";
/// Overall timeout for one conversion request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const HTML_FIELD: &str = "files";
const HTML_FILE_NAME: &str = "index.html";

/// Stateless [`PdfGenerator`] that delegates to a remote HTTP service.
#[derive(Debug, Clone)]
pub struct GotenbergPdfGenerator {
    http: Client,
    endpoint: Url,
}

impl GotenbergPdfGenerator {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        // Appended rather than joined so a base URL with a path prefix keeps it.
        let base_url = Url::parse(base_url.as_ref())?;
        let endpoint = Url::parse(&format!(
            "{}{CONVERT_HTML_PATH}",
            base_url.as_str().trim_end_matches('/')
        ))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PaperboyError::Network)?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Text fields sent alongside the HTML file, in send order.
pub(crate) fn form_fields(opts: &ConversionOptions) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("paperWidth", format!("{:.2}", opts.paper_width)),
        ("paperHeight", format!("{:.2}", opts.paper_height)),
        ("marginTop", format!("{:.2}", opts.margin_top)),
        ("marginBottom", format!("{:.2}", opts.margin_bottom)),
        ("marginLeft", format!("{:.2}", opts.margin_left)),
        ("marginRight", format!("{:.2}", opts.margin_right)),
        ("printBackground", opts.print_background.to_string()),
        ("preferCssPageSize", opts.prefer_css_page_size.to_string()),
        ("landscape", opts.landscape.to_string()),
    ];

    if let Some(delay) = opts.wait_delay_str() {
        fields.push(("waitDelay", delay.to_string()));
    }
    if let Some(expression) = opts.wait_expression() {
        fields.push(("waitForExpression", expression.to_string()));
    }

    fields
}

fn build_form(html: &str, opts: &ConversionOptions) -> Result<Form> {
    let file = Part::text(html.to_string())
        .file_name(HTML_FILE_NAME)
        .mime_str("text/html")
        .map_err(PaperboyError::Network)?;

    let form = form_fields(opts)
        .into_iter()
        .fold(Form::new().part(HTML_FIELD, file), |form, (name, value)| {
            form.text(name, value)
        });

    Ok(form)
}

#[async_trait]
impl PdfGenerator for GotenbergPdfGenerator {
    fn name(&self) -> &'static str {
        "gotenberg"
    }

    #[instrument(skip_all, fields(backend = "gotenberg", html_bytes = html.len()))]
    async fn generate_pdf(&self, html: &str, options: &ConversionOptions) -> Result<Vec<u8>> {
        let form = build_form(html, options)?;

        debug!(endpoint = %self.endpoint, "posting conversion request");
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(PaperboyError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "conversion service rejected request");
            return Err(PaperboyError::conversion(status, body));
        }

        let pdf = response.bytes().await.map_err(PaperboyError::Network)?;
        debug!(pdf_bytes = pdf.len(), "conversion finished");
        Ok(pdf.to_vec())
    }
}
