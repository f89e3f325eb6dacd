use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const CENTRAL_CONFIG_RELATIVE: &str = ".config/paperboy/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    Env {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub templates: TemplatesConfig,
    pub pdf: PdfConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub dir: PathBuf,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./templates"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfBackend {
    Chromium,
    #[default]
    Gotenberg,
}

impl fmt::Display for PdfBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfBackend::Chromium => f.write_str("chromium"),
            PdfBackend::Gotenberg => f.write_str("gotenberg"),
        }
    }
}

impl FromStr for PdfBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(PdfBackend::Chromium),
            "gotenberg" => Ok(PdfBackend::Gotenberg),
            other => Err(format!(
                "unknown pdf backend '{other}' (expected chromium or gotenberg)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub backend: PdfBackend,
    pub gotenberg: GotenbergConfig,
    pub chromium: ChromiumConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GotenbergConfig {
    pub url: String,
}

impl Default for GotenbergConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromiumConfig {
    /// Browser binary; auto-detected when unset.
    pub executable: Option<PathBuf>,
    /// V8 old-space cap for the renderer, in megabytes.
    pub heap_limit_mb: u32,
    #[serde(with = "humantime_serde")]
    pub launch_timeout: Duration,
    /// How long a single CDP command may stay unanswered. This covers a slow
    /// `waitForExpression` or a large print, so it defaults far above any
    /// realistic conversion.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            executable: None,
            heap_limit_mb: 128,
            launch_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` still wins.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Config {
    /// `$HOME/.config/paperboy/config.toml`, when `HOME` is set.
    pub fn central_config_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(CENTRAL_CONFIG_RELATIVE))
    }

    /// Loads configuration and applies environment overrides.
    /// Priority: explicit path > ~/.config/paperboy/config.toml > defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::central_config_path().filter(|p| p.is_file()) {
                Some(central) => Self::from_file(&central)?,
                None => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Overrides from `PORT`, `TEMPLATES_DIR`, `GOTENBERG_URL`, `PDF_BACKEND`
    /// and `CHROME_PATH`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("PORT") {
            self.server.port = value.trim().parse().map_err(|err| ConfigError::Env {
                name: "PORT",
                value: value.clone(),
                reason: format!("{err}"),
            })?;
        }
        if let Some(value) = get("TEMPLATES_DIR") {
            self.templates.dir = PathBuf::from(value);
        }
        if let Some(value) = get("GOTENBERG_URL") {
            self.pdf.gotenberg.url = value;
        }
        if let Some(value) = get("PDF_BACKEND") {
            self.pdf.backend = value.parse().map_err(|reason| ConfigError::Env {
                name: "PDF_BACKEND",
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(value) = get("CHROME_PATH") {
            self.pdf.chromium.executable = Some(PathBuf::from(value));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server port must be non-zero".into()));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server host must not be empty".into()));
        }
        match self.pdf.backend {
            PdfBackend::Gotenberg => {
                let url = self.pdf.gotenberg.url.trim();
                if url.is_empty() {
                    return Err(ConfigError::Invalid(
                        "Gotenberg URL must not be empty".into(),
                    ));
                }
                Url::parse(url).map_err(|err| {
                    ConfigError::Invalid(format!("Gotenberg URL {url:?} is invalid: {err}"))
                })?;
            }
            PdfBackend::Chromium => {
                if self.pdf.chromium.heap_limit_mb == 0 {
                    return Err(ConfigError::Invalid(
                        "chromium heap_limit_mb must be greater than zero".into(),
                    ));
                }
                if self.pdf.chromium.launch_timeout.is_zero() {
                    return Err(ConfigError::Invalid(
                        "chromium launch_timeout must be greater than zero".into(),
                    ));
                }
                if self.pdf.chromium.request_timeout.is_zero() {
                    return Err(ConfigError::Invalid(
                        "chromium request_timeout must be greater than zero".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}
