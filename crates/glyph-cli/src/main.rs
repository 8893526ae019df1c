use anyhow::Result;
use clap::{Parser, Subcommand};
use glyph_cli::commands::{bundle, echo, manifest, stamp};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Glyphchain: glyph manifests, echo logs and timestamp proofs.
#[derive(Parser, Debug)]
#[command(name = "glyphchain", version)]
struct Cli {
    #[command(flatten)]
    stamp: stamp::StampArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new glyph manifest
    New(manifest::NewArgs),
    /// Append a post-seal echo entry
    Echo(echo::EchoArgs),
    /// Create an OpenTimestamps proof for a glyph manifest and verify it
    Timestamp {
        /// Path to the glyph manifest JSON file
        manifest: PathBuf,
    },
    /// Verify an existing proof for a glyph manifest
    Verify {
        /// Path to the glyph manifest JSON file
        manifest: PathBuf,
        /// Proof file (default: the `.ots` file beside the manifest)
        #[arg(long)]
        proof: Option<PathBuf>,
    },
    /// Print the canonical SHA-256 digest of a glyph manifest
    Hash {
        /// Path to the glyph manifest JSON file
        manifest: PathBuf,
        /// Also print the canonical JSON that is hashed
        #[arg(long)]
        canonical: bool,
    },
    /// Package a manifest and optional echo log into a ZIP bundle
    Bundle {
        /// Path to the glyph manifest JSON file
        manifest: PathBuf,
        /// Echo log to include
        #[arg(long)]
        echo_log: Option<PathBuf>,
        /// Output archive (default: `<manifest-stem>_bundle.zip`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::New(args) => manifest::cmd_new(args).map(|_| ()),
        Commands::Echo(args) => echo::cmd_echo(args).map(|_| ()),
        Commands::Timestamp { manifest } => {
            stamp::cmd_timestamp(&manifest, cli.stamp.resolve()?).map(|_| ())
        }
        Commands::Verify { manifest, proof } => {
            stamp::cmd_verify(&manifest, proof.as_deref(), cli.stamp.resolve()?).map(|_| ())
        }
        Commands::Hash {
            manifest,
            canonical,
        } => manifest::cmd_hash(&manifest, canonical),
        Commands::Bundle {
            manifest,
            echo_log,
            output,
        } => bundle::cmd_bundle(&manifest, echo_log.as_deref(), output.as_deref()).map(|_| ()),
    }
}
