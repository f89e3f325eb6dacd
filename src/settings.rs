use std::path::{Path, PathBuf};

use paperboy_lib::{Config, PaperboyError, PdfBackend};

use crate::cli::PdfArgs;

/// CLI flags that override config file and environment values.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub templates_dir: Option<PathBuf>,
    pub backend: Option<PdfBackend>,
    pub gotenberg_url: Option<String>,
    pub chrome_path: Option<PathBuf>,
}

impl Overrides {
    pub fn with_pdf(mut self, pdf: &PdfArgs) -> Self {
        self.backend = pdf.backend.map(PdfBackend::from);
        self.gotenberg_url = pdf.gotenberg_url.clone();
        self.chrome_path = pdf.chrome_path.clone();
        self
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.templates_dir {
            config.templates.dir = dir.clone();
        }
        if let Some(backend) = self.backend {
            config.pdf.backend = backend;
        }
        if let Some(url) = &self.gotenberg_url {
            config.pdf.gotenberg.url = url.clone();
        }
        if let Some(path) = &self.chrome_path {
            config.pdf.chromium.executable = Some(path.clone());
        }
    }
}

/// Load config from a TOML file, central config, or defaults, then apply
/// environment and CLI overrides and validate the result.
/// Priority: CLI > env > explicit path > ~/.config/paperboy/config.toml > defaults
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<Config, PaperboyError> {
    let mut cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        PaperboyError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    overrides.apply(&mut cfg);

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        PaperboyError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Format effective config as a single-line string.
pub fn format_effective_config(config: &Config, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let backend_detail = match config.pdf.backend {
        PdfBackend::Gotenberg => format!("url={}", config.pdf.gotenberg.url),
        PdfBackend::Chromium => format!(
            "executable={}, heap={}MB, launch_timeout={}",
            config
                .pdf
                .chromium
                .executable
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "auto".to_string()),
            config.pdf.chromium.heap_limit_mb,
            humantime::format_duration(config.pdf.chromium.launch_timeout),
        ),
    };
    format!(
        "Effective config [{source}]: listen={}:{}, templates={}, backend={} ({backend_detail}), log={}",
        config.server.host,
        config.server.port,
        config.templates.dir.display(),
        config.pdf.backend,
        config.logging.level,
    )
}
