use chromiumoxide::error::CdpError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum PaperboyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Browser protocol error: {0}")]
    Cdp(#[from] CdpError),

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Invalid wait delay {value:?}: {source}")]
    InvalidWaitDelay {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Invalid conversion options: {0}")]
    InvalidOptions(String),

    #[error("Conversion service error {}: {body}", .status.as_u16())]
    Conversion { status: StatusCode, body: String },

    #[error("Template with name {0} not found")]
    TemplateNotFound(String),

    #[error("Template rendering failed: {0}")]
    Template(#[from] liquid::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl PaperboyError {
    pub fn conversion(status: StatusCode, body: impl Into<String>) -> Self {
        PaperboyError::Conversion {
            status,
            body: body.into(),
        }
    }

    pub fn launch(message: impl Into<String>) -> Self {
        PaperboyError::Launch(message.into())
    }

    /// Errors caused by the caller's input rather than by this process or a backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PaperboyError::InvalidOptions(_) | PaperboyError::TemplateNotFound(_)
        )
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            PaperboyError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions (templates directory, --data/--options/--output).",
            ),
            PaperboyError::Network(e) => {
                let remediation = if e.is_timeout() {
                    "The conversion service did not answer within 120s; check its load and the size of the document."
                } else {
                    "Check that the Gotenberg service is reachable at the configured URL (GOTENBERG_URL)."
                };
                ErrorPayload::new(ErrorCategory::Network, e.to_string(), remediation)
            }
            PaperboyError::InvalidUrl(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Verify the Gotenberg URL format (e.g., http://localhost:3000).",
            ),
            PaperboyError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check JSON inputs (--data/--options); run with --verbose for details.",
            ),
            PaperboyError::Cdp(e) => ErrorPayload::new(
                ErrorCategory::Browser,
                e.to_string(),
                "Check that Chromium is still running; restart the service if the tab crashed.",
            ),
            PaperboyError::Launch(msg) => {
                let lower = msg.to_ascii_lowercase();
                let remediation = if lower.contains("timed out") {
                    "Chromium started too slowly; raise pdf.chromium.launch_timeout or check system load."
                } else {
                    "Install Chromium/Chrome or point CHROME_PATH (--chrome-path) at the executable."
                };
                ErrorPayload::new(ErrorCategory::Browser, msg.to_string(), remediation)
            }
            PaperboyError::Script(msg) => ErrorPayload::new(
                ErrorCategory::Browser,
                msg.to_string(),
                "Fix the waitForExpression script; it must not throw or reject.",
            ),
            PaperboyError::InvalidWaitDelay { .. } => ErrorPayload::new(
                ErrorCategory::Options,
                self.to_string(),
                "Use a duration such as \"500ms\", \"1s\" or \"2m\" for waitDelay.",
            ),
            PaperboyError::InvalidOptions(msg) => ErrorPayload::new(
                ErrorCategory::Options,
                msg.to_string(),
                "Paper sizes must be positive and margins non-negative (inches).",
            ),
            PaperboyError::Conversion { .. } => ErrorPayload::new(
                ErrorCategory::Conversion,
                self.to_string(),
                "Inspect the conversion service logs; the response body above carries its diagnostics.",
            ),
            PaperboyError::TemplateNotFound(_) => ErrorPayload::new(
                ErrorCategory::Template,
                self.to_string(),
                "Run `paperboy templates` to list the available templates.",
            ),
            PaperboyError::Template(e) => ErrorPayload::new(
                ErrorCategory::Template,
                e.to_string(),
                "Check the Liquid syntax of the template and the shape of the data.",
            ),
            PaperboyError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("gotenberg") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Set GOTENBERG_URL (or pdf.gotenberg.url) to the base URL of the service.",
                    )
                } else if lower.contains("port") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Use a non-zero port via PORT, server.port or --port.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags, environment variables and the config file.",
                    )
                }
            }
            PaperboyError::Unknown(msg) => ErrorPayload::new(
                ErrorCategory::Unknown,
                msg.to_string(),
                "Re-run with --verbose; file an issue if persistent.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, PaperboyError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Network,
    Browser,
    Options,
    Conversion,
    Template,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
