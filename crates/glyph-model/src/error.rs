//! Errors raised by the glyph data model.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building, reading or writing glyph data.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{kind} not found: {}", path.display())]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("malformed {kind}: {reason}")]
    Malformed { kind: &'static str, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("registry extra field `{0}` collides with a fixed field")]
    ReservedField(String),

    #[error("failed to write bundle {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
