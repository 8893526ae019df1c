//! Errors raised by the timestamp client.

use glyph_model::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Install guidance shown when the `ots` client is missing.
pub const OTS_INSTALL_HINT: &str = "Install with: pip install opentimestamps-client";

#[derive(Debug, Error)]
pub enum StampError {
    #[error("{kind} not found: {}", path.display())]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("timestamp authority `{executable}` is not available. {hint}")]
    Unavailable { executable: String, hint: &'static str },

    #[error("timestamp {operation} failed: {diagnostic}")]
    Operation {
        operation: &'static str,
        diagnostic: String,
    },

    #[error("timestamp {operation} did not finish within {seconds}s")]
    Timeout { operation: &'static str, seconds: u64 },

    #[error("proof path {} would overwrite the manifest", path.display())]
    ProofPathConflict { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, StampError>;
