//! Page geometry and wait behaviour shared by every PDF backend.
//!
//! All lengths are in inches. Both backends read the same fields with the
//! same meaning; only the rendering engine behind them differs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{PaperboyError, Result};

/// US Letter width in inches.
pub const DEFAULT_PAPER_WIDTH: f64 = 8.5;
/// US Letter height in inches.
pub const DEFAULT_PAPER_HEIGHT: f64 = 11.0;
/// Default margin on every side, in inches.
pub const DEFAULT_MARGIN: f64 = 0.5;

/// Options for a single HTML to PDF conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub print_background: bool,
    #[serde(rename = "preferCSSPageSize")]
    pub prefer_css_page_size: bool,
    pub landscape: bool,
    /// Fixed delay before printing, e.g. `"1s"` or `"500ms"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_delay: Option<String>,
    /// Script evaluated in the page and awaited before printing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_expression: Option<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            paper_width: DEFAULT_PAPER_WIDTH,
            paper_height: DEFAULT_PAPER_HEIGHT,
            margin_top: DEFAULT_MARGIN,
            margin_bottom: DEFAULT_MARGIN,
            margin_left: DEFAULT_MARGIN,
            margin_right: DEFAULT_MARGIN,
            print_background: true,
            prefer_css_page_size: true,
            landscape: false,
            wait_delay: None,
            wait_for_expression: None,
        }
    }
}

impl ConversionOptions {
    /// Checks the geometry invariants: positive paper size, non-negative margins.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("paperWidth", self.paper_width),
            ("paperHeight", self.paper_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PaperboyError::InvalidOptions(format!(
                    "{name} must be a positive number of inches, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("marginTop", self.margin_top),
            ("marginBottom", self.margin_bottom),
            ("marginLeft", self.margin_left),
            ("marginRight", self.margin_right),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PaperboyError::InvalidOptions(format!(
                    "{name} must be zero or more inches, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// The configured delay, if any. Blank strings count as unset.
    pub fn wait_delay_str(&self) -> Option<&str> {
        non_blank(self.wait_delay.as_deref())
    }

    /// The custom readiness script, if any. Blank strings count as unset.
    pub fn wait_expression(&self) -> Option<&str> {
        non_blank(self.wait_for_expression.as_deref())
    }

    /// Parses `wait_delay` into a [`Duration`].
    pub fn wait_delay(&self) -> Result<Option<Duration>> {
        self.wait_delay_str()
            .map(|raw| {
                humantime::parse_duration(raw.trim()).map_err(|source| PaperboyError::InvalidWaitDelay {
                    value: raw.to_string(),
                    source,
                })
            })
            .transpose()
    }
}

/// Whitespace-only counts as unset; anything else is returned untouched.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
