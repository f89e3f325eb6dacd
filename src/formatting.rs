use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use paperboy_lib::{ErrorPayload, PaperboyError};
use serde::Serialize;

/// Error document printed to stdout on failure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub mode: &'static str,
    pub message: String,
    pub error: ErrorPayload,
}

/// Status document printed after a document was written to a file.
#[derive(Debug, Serialize)]
pub struct RenderOutput {
    pub mode: &'static str,
    pub template: String,
    pub format: &'static str,
    pub output: PathBuf,
    pub bytes: usize,
}

pub fn print_json<T: Serialize>(body: &T) -> Result<(), PaperboyError> {
    let content = serde_json::to_string(body)?;
    println!("{content}");
    Ok(())
}

/// Writes a rendered document to `output`, or raw to stdout.
pub fn write_document(bytes: &[u8], output: Option<&Path>) -> Result<(), PaperboyError> {
    match output {
        Some(path) => std::fs::write(path, bytes)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: PaperboyError) -> ExitCode {
    let error = err.to_payload();
    let payload = ErrorOutput {
        mode: "error",
        message: error.message.clone(),
        error,
    };

    let content = serde_json::to_string(&payload)
        .unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
    println!("{content}");

    ExitCode::from(2)
}
