//! Persisting and printing the final response.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Writes `text` plus one trailing newline to `path`, replacing any
/// existing file.
pub fn write_response(path: &Path, text: &str) -> Result<()> {
    let mut contents = String::with_capacity(text.len() + 1);
    contents.push_str(text);
    contents.push('\n');
    fs::write(path, contents)
        .with_context(|| format!("Failed to write response to '{}'", path.display()))?;
    info!(path = %path.display(), bytes = text.len() + 1, "response saved");
    Ok(())
}

/// Prints `text` and a newline to standard output.
pub fn print_response(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}").context("Failed to write response to stdout")?;
    stdout.flush().context("Failed to flush stdout")
}
