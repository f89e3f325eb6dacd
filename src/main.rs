mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::{Commands, ServeArgs};
use commands::{run_render, run_serve, run_templates};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let args = cli::parse();
    let command = args
        .command
        .unwrap_or_else(|| Commands::Serve(ServeArgs::default()));

    match command {
        Commands::Serve(serve) => run_serve(args.config, args.verbose, serve).await,
        Commands::Templates { templates_dir } => {
            run_templates(args.config, args.verbose, templates_dir).await
        }
        Commands::Render(render) => run_render(args.config, args.verbose, render).await,
    }
}
