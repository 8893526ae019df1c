//! The capability a timestamping authority must provide.

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What an authority hands back after accepting a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Where the authority wrote the proof artifact.
    pub proof_path: PathBuf,
    /// Digest the authority reports having stamped, when it reports one.
    pub reported_hash: Option<String>,
}

/// An external timestamping authority.
///
/// Implementations only move bytes and report results; proof mathematics
/// stay on the authority's side.
pub trait ProofAuthority {
    /// Whether the authority can be reached at all.
    fn check_available(&self) -> bool;

    /// Submit `file` for timestamping.
    ///
    /// Must not leave a proof artifact behind when it fails.
    fn submit(&self, file: &Path, timeout: Duration, min_attestations: u32) -> Result<Submission>;

    /// Ask the authority to check `proof` against `file`.
    ///
    /// Returns the authority's raw output. A proof that does not validate is
    /// still `Ok`; errors are reserved for failing to ask at all.
    fn verify(&self, file: &Path, proof: &Path) -> Result<String>;
}
