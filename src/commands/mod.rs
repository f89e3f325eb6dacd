mod render;
mod serve;
mod templates;

use std::path::Path;

use paperboy_lib::{telemetry, Config, PaperboyError};
use tracing::debug;

use crate::settings::{format_effective_config, load_config, Overrides};

pub use render::run_render;
pub use serve::run_serve;
pub use templates::run_templates;

/// Resolves configuration and installs logging; shared by every command.
fn prepare(
    config_path: Option<&Path>,
    verbose: bool,
    overrides: &Overrides,
) -> Result<Config, PaperboyError> {
    let config = load_config(config_path, overrides)?;
    telemetry::init(&config.logging, verbose)?;
    debug!("{}", format_effective_config(&config, config_path));
    Ok(config)
}
