use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};
use crate::{PaperboyError, Result};

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level; `verbose` lowers the default to `debug`.
pub fn init(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_directive(&logging.level, verbose))
        .from_env_lossy();

    // stdout belongs to command output; logs go to stderr.
    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| PaperboyError::Config(format!("failed to install tracing subscriber: {err}")))
}

fn default_directive(level: &str, verbose: bool) -> Directive {
    if verbose {
        return LevelFilter::DEBUG.into();
    }
    level
        .parse::<Directive>()
        .unwrap_or_else(|_| LevelFilter::INFO.into())
}
