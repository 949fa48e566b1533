//! Shared output layer: human text or stable JSON per command.

use serde::Serialize;
use std::io::Write;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per result).
    Json,
}

/// Render a value: pretty JSON in JSON mode, otherwise the closure's text.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        }
        OutputMode::Human => human(value, &mut stdout)?,
    }
    Ok(())
}

/// Render a left-aligned key/value line in human output.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> std::io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}
