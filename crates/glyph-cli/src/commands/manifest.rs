//! Manifest creation and hashing commands.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use glyph_model::{Manifest, DEFAULT_TRUTH_ANCHOR};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Glyph ID
    #[arg(long)]
    pub id: String,
    /// Glyph name
    #[arg(long)]
    pub name: String,
    /// Creator name
    #[arg(long)]
    pub creator: String,
    /// Comma-separated core concepts
    #[arg(long)]
    pub concepts: String,
    /// Dedication message, attributed to the creator
    #[arg(long, default_value = "")]
    pub dedication: String,
    /// Closing lines
    #[arg(long, num_args = 0..)]
    pub closing: Vec<String>,
    /// Provenance tag for the glyph
    #[arg(long, default_value = DEFAULT_TRUTH_ANCHOR)]
    pub truth_anchor: String,
    /// Directory to save the glyph manifest in
    #[arg(long, default_value = "glyphs")]
    pub output_dir: PathBuf,
}

/// Split a comma-separated concept list, keeping order and dropping blanks.
pub fn parse_concepts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Handle `glyphchain new`. Returns the path of the written manifest.
pub fn cmd_new(args: NewArgs) -> Result<PathBuf> {
    let mut glyph = Manifest::new(
        &args.id,
        args.name,
        &args.creator,
        parse_concepts(&args.concepts),
        args.truth_anchor,
    );
    if !args.dedication.is_empty() {
        glyph.set_dedication(args.dedication, &args.creator);
    }
    glyph.set_closing(args.closing);

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("failed to create output directory {}", args.output_dir.display())
    })?;
    let path = args.output_dir.join(format!("{}_manifest.json", args.id));
    glyph
        .save(&path)
        .with_context(|| format!("failed to save glyph manifest to {}", path.display()))?;

    info!(glyph_id = %args.id, path = %path.display(), "glyph created");
    println!("{} Glyph manifest saved to {}", "✓".green(), path.display());
    Ok(path)
}

/// Handle `glyphchain hash`.
pub fn cmd_hash(manifest_path: &Path, canonical: bool) -> Result<()> {
    let glyph = Manifest::load(manifest_path)
        .with_context(|| format!("failed to load manifest from {}", manifest_path.display()))?;
    let form = glyph.to_canonical_form();
    if canonical {
        println!("{}", glyph_hash::canonical_json(&form));
    }
    println!("{}: {}", "sha256".bold(), glyph_hash::digest(&form));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_concepts() {
        assert_eq!(
            parse_concepts(" Resonance, Memory ,,Echo "),
            ["Resonance", "Memory", "Echo"]
        );
        assert!(parse_concepts("").is_empty());
    }

    #[test]
    fn test_cmd_new_creates_directory() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().join("nested").join("glyphs");
        let path = cmd_new(NewArgs {
            id: "GLYPH-TEST".to_string(),
            name: "Test Glyph".to_string(),
            creator: "UnitTester".to_string(),
            concepts: "Concept1,Concept2".to_string(),
            dedication: "Test dedication".to_string(),
            closing: vec!["Line one".to_string(), "Line two".to_string()],
            truth_anchor: DEFAULT_TRUTH_ANCHOR.to_string(),
            output_dir: output_dir.clone(),
        })
        .unwrap();

        assert_eq!(path, output_dir.join("GLYPH-TEST_manifest.json"));
        let glyph = Manifest::load(&path).unwrap();
        assert_eq!(glyph.concepts(), ["Concept1".to_string(), "Concept2".to_string()]);
        assert_eq!(glyph.dedication().unwrap().author, "UnitTester");
        assert_eq!(glyph.closing().len(), 2);
    }

    #[test]
    fn test_cmd_new_without_dedication() {
        let dir = TempDir::new().unwrap();
        let path = cmd_new(NewArgs {
            id: "G-2".to_string(),
            name: "Two".to_string(),
            creator: "Maker".to_string(),
            concepts: "a".to_string(),
            dedication: String::new(),
            closing: vec![],
            truth_anchor: DEFAULT_TRUTH_ANCHOR.to_string(),
            output_dir: dir.path().to_path_buf(),
        })
        .unwrap();
        assert!(Manifest::load(&path).unwrap().dedication().is_none());
    }
}
