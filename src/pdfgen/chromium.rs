//! Chromium backend: one long-lived headless browser and one reused tab.
//!
//! Every conversion takes the tab lock for its whole sequence (inject,
//! readiness waits, delay, print), so concurrent callers queue instead of
//! opening more tabs. That bounds memory to a single renderer.

use std::time::Instant;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    GetFrameTreeParams, PrintToPdfParams, SetDocumentContentParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{EvaluateParams, ExceptionDetails};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::scripts::{readiness_probe, READINESS_FALLBACK};
use super::PdfGenerator;
use crate::config::ChromiumConfig;
use crate::{ConversionOptions, PaperboyError, Result};

/// Page the tab is parked on between conversions.
const BLANK_PAGE: &str = "about:blank";

/// Print parameters handed to the browser, taken verbatim from [`ConversionOptions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintSettings {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
    pub landscape: bool,
}

impl From<&ConversionOptions> for PrintSettings {
    fn from(opts: &ConversionOptions) -> Self {
        Self {
            paper_width: opts.paper_width,
            paper_height: opts.paper_height,
            margin_top: opts.margin_top,
            margin_bottom: opts.margin_bottom,
            margin_left: opts.margin_left,
            margin_right: opts.margin_right,
            print_background: opts.print_background,
            prefer_css_page_size: opts.prefer_css_page_size,
            landscape: opts.landscape,
        }
    }
}

/// The three tab operations a conversion needs.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Replaces the document of the root frame with `html`. No navigation happens.
    async fn set_content(&self, html: &str) -> Result<()>;

    /// Evaluates `expression`, awaiting it if it yields a promise.
    /// A thrown exception or rejected promise is an error.
    async fn evaluate(&self, expression: &str) -> Result<()>;

    async fn print_to_pdf(&self, settings: &PrintSettings) -> Result<Vec<u8>>;
}

/// [`PageDriver`] over a chromiumoxide page (Chrome DevTools Protocol).
#[derive(Clone)]
pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn set_content(&self, html: &str) -> Result<()> {
        let tree = self.page.execute(GetFrameTreeParams::default()).await?;
        let frame_id = tree.result.frame_tree.frame.id.clone();
        self.page
            .execute(SetDocumentContentParams::new(frame_id, html))
            .await?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<()> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .build()
            .map_err(PaperboyError::Script)?;

        let response = self.page.execute(params).await?;
        match response.result.exception_details.as_ref() {
            Some(details) => Err(PaperboyError::Script(describe_exception(details))),
            None => Ok(()),
        }
    }

    async fn print_to_pdf(&self, settings: &PrintSettings) -> Result<Vec<u8>> {
        let params = PrintToPdfParams::builder()
            .paper_width(settings.paper_width)
            .paper_height(settings.paper_height)
            .margin_top(settings.margin_top)
            .margin_bottom(settings.margin_bottom)
            .margin_left(settings.margin_left)
            .margin_right(settings.margin_right)
            .print_background(settings.print_background)
            .prefer_css_page_size(settings.prefer_css_page_size)
            .landscape(settings.landscape)
            .build();

        Ok(self.page.pdf(params).await?)
    }
}

fn describe_exception(details: &ExceptionDetails) -> String {
    details
        .exception
        .as_ref()
        .and_then(|exception| exception.description.clone())
        .unwrap_or_else(|| details.text.clone())
}

/// Flags for a small-footprint headless browser.
pub(crate) fn chromium_args(heap_limit_mb: u32) -> Vec<String> {
    let mut args: Vec<String> = [
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-plugins",
        "--disable-background-networking",
        "--disable-sync",
        "--disable-translate",
        "--disable-default-apps",
        "--disable-breakpad",
        "--disable-component-extensions-with-background-pages",
        "--disable-features=TranslateUI",
        "--disable-ipc-flooding-protection",
        "--disable-renderer-backgrounding",
        "--disable-hang-monitor",
        "--disable-backgrounding-occluded-windows",
        "--disable-smooth-scrolling",
        "--disable-lcd-text",
        "--hide-scrollbars",
        "--mute-audio",
        "--force-color-profile=srgb",
    ]
    .iter()
    .map(|flag| flag.to_string())
    .collect();
    args.push(format!("--js-flags=--max-old-space-size={heap_limit_mb}"));
    args
}

/// Builds the launch configuration. chromiumoxide applies its own launch and
/// per-command deadlines, so both are set from `settings` rather than left at
/// the library defaults.
pub(crate) fn browser_config(settings: &ChromiumConfig) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .launch_timeout(settings.launch_timeout)
        .request_timeout(settings.request_timeout)
        .args(chromium_args(settings.heap_limit_mb));
    if let Some(path) = &settings.executable {
        builder = builder.chrome_executable(path);
    }
    builder.build().map_err(PaperboyError::launch)
}

/// An owned headless browser process plus the task pumping its CDP events.
pub struct BrowserSession {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Starts the browser. Fails if the executable is missing or the launch
    /// exceeds `settings.launch_timeout`.
    pub async fn launch(settings: &ChromiumConfig) -> Result<Self> {
        let config = browser_config(settings)?;

        let (browser, mut handler) = timeout(settings.launch_timeout, Browser::launch(config))
            .await
            .map_err(|_| {
                PaperboyError::launch(format!(
                    "Chromium launch timed out after {:?}",
                    settings.launch_timeout
                ))
            })?
            .map_err(|err| PaperboyError::launch(err.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "chromium handler event error");
                }
            }
            debug!("chromium handler finished");
        });

        info!(
            heap_limit_mb = settings.heap_limit_mb,
            executable = ?settings.executable,
            "launched headless chromium"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
        })
    }

    pub async fn open_page(&self, url: &str) -> Result<Page> {
        let browser = self.browser.lock().await;
        Ok(browser.new_page(url).await?)
    }

    /// Closes the browser, killing the process if the polite close fails.
    pub async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await;
        if let Err(err) = &closed {
            warn!(error = %err, "chromium did not close cleanly; killing process");
            if let Some(Err(kill_err)) = browser.kill().await {
                warn!(error = %kill_err, "failed to kill chromium");
            }
        }
        if let Err(err) = browser.wait().await {
            debug!(error = %err, "failed waiting for chromium to exit");
        }
        self.handler.abort();
        info!("chromium session closed");
        closed.map(|_| ()).map_err(PaperboyError::from)
    }
}

/// Browser-driven [`PdfGenerator`].
pub struct ChromiumPdfGenerator<P = CdpPage> {
    page: Mutex<P>,
    session: Option<BrowserSession>,
    readiness_probe: String,
}

impl ChromiumPdfGenerator<CdpPage> {
    /// Launches Chromium and parks one tab on `about:blank`.
    ///
    /// The browser is shut down again if the tab cannot be opened.
    pub async fn launch(settings: &ChromiumConfig) -> Result<Self> {
        let session = BrowserSession::launch(settings).await?;
        let page = match session.open_page(BLANK_PAGE).await {
            Ok(page) => page,
            Err(err) => {
                if let Err(close_err) = session.close().await {
                    warn!(error = %close_err, "failed to release chromium after tab error");
                }
                return Err(err);
            }
        };

        let mut generator = Self::with_page(CdpPage::new(page));
        generator.session = Some(session);
        Ok(generator)
    }
}

impl<P: PageDriver> ChromiumPdfGenerator<P> {
    /// Wraps an already open tab. The caller keeps ownership of the browser
    /// process, so [`PdfGenerator::close`] does nothing.
    pub fn with_page(page: P) -> Self {
        Self {
            page: Mutex::new(page),
            session: None,
            readiness_probe: readiness_probe(READINESS_FALLBACK),
        }
    }

    async fn convert(&self, page: &P, html: &str, options: &ConversionOptions) -> Result<Vec<u8>> {
        debug!("injecting document content");
        page.set_content(html).await?;

        debug!("waiting for images and fonts");
        page.evaluate(&self.readiness_probe).await?;

        if let Some(expression) = options.wait_expression() {
            debug!("waiting for custom expression");
            page.evaluate(expression).await?;
        }

        if let Some(delay) = options.wait_delay()? {
            debug!(?delay, "waiting fixed delay");
            tokio::time::sleep(delay).await;
        }

        debug!("printing to pdf");
        page.print_to_pdf(&PrintSettings::from(options)).await
    }
}

#[async_trait]
impl<P: PageDriver + 'static> PdfGenerator for ChromiumPdfGenerator<P> {
    fn name(&self) -> &'static str {
        "chromium"
    }

    #[instrument(skip_all, fields(backend = "chromium", html_bytes = html.len()))]
    async fn generate_pdf(&self, html: &str, options: &ConversionOptions) -> Result<Vec<u8>> {
        let queued = Instant::now();
        let page = self.page.lock().await;
        let started = Instant::now();
        debug!(queued_ms = queued.elapsed().as_millis() as u64, "acquired tab");

        let result = self.convert(&page, html, options).await;
        drop(page);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(pdf) => debug!(pdf_bytes = pdf.len(), elapsed_ms, "conversion finished"),
            Err(err) => warn!(error = %err, elapsed_ms, "conversion failed"),
        }
        result
    }

    async fn close(&self) -> Result<()> {
        match &self.session {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}
