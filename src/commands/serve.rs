use std::path::PathBuf;
use std::process::ExitCode;

use paperboy_lib::server::{self, AppState};
use paperboy_lib::{build_generator, PaperboyError, TemplateService};
use tokio::net::TcpListener;
use tracing::warn;

use crate::cli::ServeArgs;
use crate::formatting::render_error;
use crate::settings::Overrides;

/// Run the serve command.
pub async fn run_serve(config_path: Option<PathBuf>, verbose: bool, args: ServeArgs) -> ExitCode {
    let overrides = Overrides {
        host: args.host,
        port: args.port,
        templates_dir: args.templates_dir,
        ..Overrides::default()
    }
    .with_pdf(&args.pdf);

    match serve(config_path, verbose, &overrides).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => render_error(err),
    }
}

async fn serve(
    config_path: Option<PathBuf>,
    verbose: bool,
    overrides: &Overrides,
) -> Result<(), PaperboyError> {
    let config = super::prepare(config_path.as_deref(), verbose, overrides)?;
    let generator = build_generator(&config.pdf).await?;

    let listener =
        match TcpListener::bind((config.server.host.as_str(), config.server.port)).await {
            Ok(listener) => listener,
            Err(err) => {
                if let Err(close_err) = generator.close().await {
                    warn!(error = %close_err, "failed to close pdf backend");
                }
                return Err(err.into());
            }
        };

    let service = TemplateService::new(&config.templates.dir).with_generator(generator);
    server::run(listener, AppState::new(service), server::shutdown_signal()).await
}
