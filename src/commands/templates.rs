use std::path::PathBuf;
use std::process::ExitCode;

use paperboy_lib::TemplateService;

use crate::formatting::{print_json, render_error};
use crate::settings::Overrides;

/// Run the templates command.
pub async fn run_templates(
    config_path: Option<PathBuf>,
    verbose: bool,
    templates_dir: Option<PathBuf>,
) -> ExitCode {
    let overrides = Overrides {
        templates_dir,
        ..Overrides::default()
    };
    let config = match super::prepare(config_path.as_deref(), verbose, &overrides) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err),
    };

    let service = TemplateService::new(&config.templates.dir);
    let templates = match service.list().await {
        Ok(templates) => templates,
        Err(err) => return render_error(err),
    };

    match print_json(&templates) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => render_error(err),
    }
}
