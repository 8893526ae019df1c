//! Bundle export command.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Handle `glyphchain bundle`.
pub fn cmd_bundle(manifest: &Path, echo_log: Option<&Path>, output: Option<&Path>) -> Result<PathBuf> {
    let path = glyph_model::export_bundle(manifest, echo_log, output)
        .with_context(|| format!("failed to bundle {}", manifest.display()))?;
    println!("{} Bundle written to {}", "✓".green(), path.display());
    Ok(path)
}
