//! Echo log command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use glyph_model::{EchoAnnotations, EchoLog, DEFAULT_TRUTH_ANCHOR};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct EchoArgs {
    /// Node ID
    #[arg(long)]
    pub node: String,
    /// Vector string
    #[arg(long)]
    pub vector: String,
    /// Assertion string
    #[arg(long)]
    pub assertion: String,
    /// Optional trace ID
    #[arg(long)]
    pub trace: Option<String>,
    /// Optional symbol
    #[arg(long)]
    pub symbol: Option<String>,
    /// Optional symbolic meaning
    #[arg(long)]
    pub meaning: Option<String>,
    /// Provenance tag for the entry
    #[arg(long, default_value = DEFAULT_TRUTH_ANCHOR)]
    pub truth_anchor: String,
    /// Echo log file; created if missing, appended to otherwise
    #[arg(long, default_value = "glyph_echo_log.json")]
    pub output: PathBuf,
}

/// Handle `glyphchain echo`. Returns the number of entries now in the log.
pub fn cmd_echo(args: EchoArgs) -> Result<usize> {
    let mut log = EchoLog::load_or_default(&args.output)
        .with_context(|| format!("failed to read echo log {}", args.output.display()))?;

    let annotations = EchoAnnotations {
        trace_id: args.trace,
        symbol: args.symbol,
        meaning: args.meaning,
    };
    log.add_entry(
        args.node,
        args.vector,
        args.assertion,
        annotations,
        args.truth_anchor,
    );
    log.save(&args.output)
        .with_context(|| format!("failed to write echo log {}", args.output.display()))?;

    println!(
        "{} Echo log saved to {} ({} entries)",
        "✓".green(),
        args.output.display(),
        log.len()
    );
    Ok(log.len())
}
