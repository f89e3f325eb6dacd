use clap::{Args, Parser, Subcommand, ValueEnum};
use paperboy_lib::PdfBackend;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paperboy")]
#[command(
    version,
    about = "Paperboy - Render HTML templates to PDF",
    long_about = "Paperboy\n\nModes:\n- serve: run the JSON API under /api/v1 (default when no subcommand is given).\n- templates: list the templates available in the template directory.\n- render: render one template to HTML or PDF without starting the server.\n\nPDFs come from a local headless Chromium or a Gotenberg-compatible service.\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (TOML); defaults to ~/.config/paperboy/config.toml. Env vars and CLI flags override it"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// List available templates as JSON
    Templates {
        #[arg(long, value_name = "DIR", help = "Template directory")]
        templates_dir: Option<PathBuf>,
    },

    /// Render a single template to HTML or PDF
    Render(RenderArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Address to bind")]
    pub host: Option<String>,

    #[arg(long, short, help = "Port to listen on")]
    pub port: Option<u16>,

    #[arg(long, value_name = "DIR", help = "Template directory")]
    pub templates_dir: Option<PathBuf>,

    #[command(flatten)]
    pub pdf: PdfArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    #[arg(long, short, help = "Template file name, e.g. invoice.html")]
    pub template: String,

    #[arg(
        long,
        short,
        value_name = "PATH",
        help = "Template data as a JSON or YAML object (by extension)"
    )]
    pub data: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Conversion options as JSON (paperWidth, marginTop, waitDelay, ...)"
    )]
    pub options: Option<PathBuf>,

    #[arg(long, help = "Emit rendered HTML instead of PDF")]
    pub html: bool,

    #[arg(
        long,
        short,
        help = "Write the document to this file (JSON status is printed to stdout); raw bytes go to stdout if omitted"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Template directory")]
    pub templates_dir: Option<PathBuf>,

    #[command(flatten)]
    pub pdf: PdfArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PdfArgs {
    #[arg(long, value_enum, help = "PDF backend")]
    pub backend: Option<BackendArg>,

    #[arg(long, value_name = "URL", help = "Base URL of the Gotenberg service")]
    pub gotenberg_url: Option<String>,

    #[arg(long, value_name = "PATH", help = "Chromium/Chrome executable")]
    pub chrome_path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackendArg {
    Chromium,
    Gotenberg,
}

impl From<BackendArg> for PdfBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Chromium => PdfBackend::Chromium,
            BackendArg::Gotenberg => PdfBackend::Gotenberg,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
