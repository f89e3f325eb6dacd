use std::path::{Path, PathBuf};
use std::process::ExitCode;

use paperboy_lib::{build_generator, ConversionOptions, PaperboyError, TemplateData, TemplateService};
use tracing::{info, warn};

use crate::cli::RenderArgs;
use crate::formatting::{print_json, render_error, write_document, RenderOutput};
use crate::settings::Overrides;

/// Run the render command.
pub async fn run_render(config_path: Option<PathBuf>, verbose: bool, args: RenderArgs) -> ExitCode {
    match render(config_path, verbose, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => render_error(err),
    }
}

async fn render(
    config_path: Option<PathBuf>,
    verbose: bool,
    args: &RenderArgs,
) -> Result<(), PaperboyError> {
    let overrides = Overrides {
        templates_dir: args.templates_dir.clone(),
        ..Overrides::default()
    }
    .with_pdf(&args.pdf);
    let config = super::prepare(config_path.as_deref(), verbose, &overrides)?;

    let data = match &args.data {
        Some(path) => load_data(path)?,
        None => TemplateData::new(),
    };
    let options = match &args.options {
        Some(path) => load_options(path)?,
        None => ConversionOptions::default(),
    };

    let service = TemplateService::new(&config.templates.dir);
    let (document, format) = if args.html {
        let html = service.render_html(&args.template, &data).await?;
        (html.into_bytes(), "html")
    } else {
        // Fail on bad options before paying for a browser launch.
        options.validate()?;
        let generator = build_generator(&config.pdf).await?;
        let service = service.with_generator(generator.clone());
        let result = service.render_pdf(&args.template, &data, &options).await;
        if let Err(err) = generator.close().await {
            warn!(error = %err, "failed to close pdf backend");
        }
        (result?, "pdf")
    };

    write_document(&document, args.output.as_deref())?;

    if let Some(output) = &args.output {
        info!(path = %output.display(), bytes = document.len(), "document written");
        print_json(&RenderOutput {
            mode: "render",
            template: args.template.clone(),
            format,
            output: output.clone(),
            bytes: document.len(),
        })?;
    }
    Ok(())
}

/// Reads template data from a JSON or YAML (`.yaml`/`.yml`) object file.
fn load_data(path: &Path) -> Result<TemplateData, PaperboyError> {
    let raw = std::fs::read_to_string(path)?;
    if is_yaml(path) {
        serde_yaml::from_str(&raw).map_err(|e| {
            PaperboyError::Config(format!("Invalid data file {}: {}", path.display(), e))
        })
    } else {
        Ok(serde_json::from_str(&raw)?)
    }
}

fn load_options(path: &Path) -> Result<ConversionOptions, PaperboyError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}
