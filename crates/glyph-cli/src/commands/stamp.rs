//! Timestamp proof commands.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use glyph_stamp::{StampConfig, TimestampClient, Verification};
use std::path::{Path, PathBuf};

/// Options shared by every command that talks to the timestamp authority.
#[derive(Debug, Clone, Default, Args)]
pub struct StampArgs {
    /// TOML file with timestamp client settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Path to the `ots` executable
    #[arg(long, global = true)]
    pub ots_bin: Option<PathBuf>,
    /// Submission timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
    /// Minimum number of calendar attestations
    #[arg(long, global = true)]
    pub min_attestations: Option<u32>,
}

impl StampArgs {
    /// Defaults, overlaid by the config file, overlaid by flags.
    pub fn resolve(&self) -> Result<StampConfig> {
        let mut config = match &self.config {
            Some(path) => StampConfig::from_toml_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => StampConfig::default(),
        };
        if let Some(bin) = &self.ots_bin {
            config.executable = bin.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(min) = self.min_attestations {
            config.min_attestations = min;
        }
        Ok(config)
    }
}

fn print_verification(verification: &Verification) {
    if verification.valid {
        println!("{} Timestamp verification successful", "✓".green().bold());
    } else {
        println!("{} Timestamp verification failed", "⚠".yellow().bold());
    }
    println!("{}", verification.message);
}

/// Handle `glyphchain timestamp`: stamp a manifest, then verify the new proof.
pub fn cmd_timestamp(manifest: &Path, config: StampConfig) -> Result<Verification> {
    let client = TimestampClient::ots(config);
    let outcome = client
        .stamp_manifest(manifest)
        .with_context(|| format!("failed to timestamp {}", manifest.display()))?;

    println!(
        "{}: {}",
        "OpenTimestamps proof saved to".bold(),
        outcome.receipt.proof_path.display()
    );
    println!("{}: {}", "Timestamp hash".bold(), outcome.receipt.digest);
    println!("{}: {}", "Manifest digest".bold(), outcome.canonical_digest);
    print_verification(&outcome.verification);
    Ok(outcome.verification)
}

/// Handle `glyphchain verify`. The proof defaults to the one beside the manifest.
pub fn cmd_verify(manifest: &Path, proof: Option<&Path>, config: StampConfig) -> Result<Verification> {
    let client = TimestampClient::ots(config);
    let proof = proof
        .map(Path::to_path_buf)
        .unwrap_or_else(|| client.proof_path_for(manifest));
    let verification = client
        .verify_manifest(manifest, &proof)
        .with_context(|| format!("failed to verify {}", proof.display()))?;
    print_verification(&verification);
    Ok(verification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_defaults() {
        let config = StampArgs::default().resolve().unwrap();
        assert_eq!(config, StampConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 60\nmin_attestations = 4").unwrap();

        let args = StampArgs {
            config: Some(file.path().to_path_buf()),
            ots_bin: Some(PathBuf::from("/opt/ots/bin/ots")),
            timeout: Some(120),
            min_attestations: None,
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.min_attestations, 4);
        assert_eq!(config.executable, PathBuf::from("/opt/ots/bin/ots"));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let args = StampArgs {
            config: Some(PathBuf::from("/nonexistent/glyphchain.toml")),
            ..StampArgs::default()
        };
        assert!(args.resolve().is_err());
    }
}
