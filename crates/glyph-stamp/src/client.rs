//! Proof creation and verification workflow.

use crate::authority::ProofAuthority;
use crate::config::StampConfig;
use crate::error::{Result, StampError};
use crate::ots::OtsAuthority;
use glyph_model::Manifest;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// A proof that was created and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampReceipt {
    pub proof_path: PathBuf,
    /// SHA-256 of the exact bytes submitted.
    pub digest: String,
}

/// Outcome of asking the authority about a proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    /// Authority output, or a short explanation when it said nothing.
    pub message: String,
}

/// Result of the full stamp-then-verify workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampOutcome {
    pub receipt: StampReceipt,
    pub verification: Verification,
    /// Canonical digest of the manifest that was stamped.
    pub canonical_digest: String,
}

/// Bridges manifests on disk and a [`ProofAuthority`].
///
/// Never retries on its own; a failed call is reported and left to the caller.
pub struct TimestampClient<A: ProofAuthority> {
    authority: A,
    config: StampConfig,
}

impl TimestampClient<OtsAuthority> {
    /// Client for the `ots` executable named in `config`.
    pub fn ots(config: StampConfig) -> Self {
        let authority = OtsAuthority::from_config(&config);
        Self::new(authority, config)
    }
}

impl<A: ProofAuthority> TimestampClient<A> {
    pub fn new(authority: A, config: StampConfig) -> Self {
        Self { authority, config }
    }

    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// Where the proof for `manifest_path` lives: same base name, proof extension.
    pub fn proof_path_for(&self, manifest_path: &Path) -> PathBuf {
        manifest_path.with_extension(&self.config.proof_extension)
    }

    /// Timestamp the file at `manifest_path` as it is on disk.
    pub fn create_proof(&self, manifest_path: &Path) -> Result<StampReceipt> {
        let destination = self.destination_for(manifest_path)?;
        self.create_proof_at(manifest_path, &destination)
    }

    /// Check `proof_path` against the file at `manifest_path`.
    ///
    /// A proof that does not validate yields `valid: false`; only missing
    /// inputs or a missing authority are errors.
    pub fn verify_proof(&self, manifest_path: &Path, proof_path: &Path) -> Result<Verification> {
        require_file(manifest_path, "manifest")?;
        require_file(proof_path, "proof")?;
        self.require_authority()?;

        debug!(manifest = %manifest_path.display(), proof = %proof_path.display(), "verifying");
        let output = self.authority.verify(manifest_path, proof_path)?;
        let verification = self.interpret(&output);
        if verification.valid {
            info!(proof = %proof_path.display(), "proof verified");
        } else {
            warn!(proof = %proof_path.display(), message = %verification.message, "proof did not verify");
        }
        Ok(verification)
    }

    /// Normalize, stamp and verify a manifest.
    ///
    /// The manifest is re-rendered into a temporary file beside it, which is
    /// what gets stamped; the proof is stored next to the original manifest.
    /// The temporary file is removed whether or not the workflow succeeds.
    pub fn stamp_manifest(&self, manifest_path: &Path) -> Result<StampOutcome> {
        let destination = self.destination_for(manifest_path)?;
        let (manifest, snapshot) = self.normalized_snapshot(manifest_path)?;

        let receipt = self.create_proof_at(snapshot.path(), &destination)?;
        let verification = self.verify_proof(snapshot.path(), &receipt.proof_path)?;

        Ok(StampOutcome {
            receipt,
            verification,
            canonical_digest: manifest.digest(),
        })
    }

    /// Verify a proof made by [`stamp_manifest`](Self::stamp_manifest),
    /// re-deriving the normalized snapshot from the manifest on disk.
    pub fn verify_manifest(&self, manifest_path: &Path, proof_path: &Path) -> Result<Verification> {
        require_file(proof_path, "proof")?;
        let (_, snapshot) = self.normalized_snapshot(manifest_path)?;
        self.verify_proof(snapshot.path(), proof_path)
    }

    fn create_proof_at(&self, snapshot: &Path, destination: &Path) -> Result<StampReceipt> {
        require_file(snapshot, "manifest")?;
        self.require_authority()?;

        let bytes = fs::read(snapshot).map_err(|source| StampError::Io {
            path: snapshot.to_path_buf(),
            source,
        })?;
        let digest = glyph_hash::digest_bytes(&bytes);

        let mut guard = ProofGuard::default();
        guard.track(destination);

        info!(
            state = "submitting",
            file = %snapshot.display(),
            %digest,
            timeout_s = self.config.timeout_secs,
            min_attestations = self.config.min_attestations,
            "requesting timestamp"
        );
        let submission =
            self.authority
                .submit(snapshot, self.config.timeout(), self.config.min_attestations)?;
        if submission.proof_path != destination {
            guard.track_created(&submission.proof_path);
        }

        if submission.proof_path != destination {
            fs::rename(&submission.proof_path, destination).map_err(|source| StampError::Io {
                path: destination.to_path_buf(),
                source,
            })?;
        }
        if !destination.is_file() {
            return Err(StampError::Operation {
                operation: "stamp",
                diagnostic: format!("no proof found at {}", destination.display()),
            });
        }
        if let Some(reported) = &submission.reported_hash {
            if !reported.eq_ignore_ascii_case(&digest) {
                warn!(%reported, %digest, "authority reported a different digest");
            }
        }

        guard.disarm();
        info!(state = "proven", proof = %destination.display(), "timestamp created");
        Ok(StampReceipt {
            proof_path: destination.to_path_buf(),
            digest,
        })
    }

    /// The proof location for `manifest_path`, refusing one that is the manifest itself.
    fn destination_for(&self, manifest_path: &Path) -> Result<PathBuf> {
        let destination = self.proof_path_for(manifest_path);
        if destination == manifest_path {
            return Err(StampError::ProofPathConflict { path: destination });
        }
        Ok(destination)
    }

    fn require_authority(&self) -> Result<()> {
        if self.authority.check_available() {
            Ok(())
        } else {
            Err(StampError::Unavailable {
                executable: self.config.executable.display().to_string(),
                hint: crate::error::OTS_INSTALL_HINT,
            })
        }
    }

    fn interpret(&self, output: &str) -> Verification {
        let message = output.trim();
        Verification {
            valid: output.contains(&self.config.success_marker),
            message: if message.is_empty() {
                "authority returned no output".to_string()
            } else {
                message.to_string()
            },
        }
    }

    fn normalized_snapshot(&self, manifest_path: &Path) -> Result<(Manifest, NamedTempFile)> {
        let manifest = Manifest::load(manifest_path)?;
        let dir = match manifest_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let stem = manifest_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "glyph".to_string());

        let io_err = |source| StampError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut snapshot = tempfile::Builder::new()
            .prefix(&format!("{stem}_temp"))
            .suffix(".json")
            .tempfile_in(dir)
            .map_err(io_err)?;
        snapshot
            .write_all(manifest.to_json_pretty()?.as_bytes())
            .map_err(io_err)?;
        snapshot.flush().map_err(io_err)?;

        debug!(snapshot = %snapshot.path().display(), "normalized manifest written");
        Ok((manifest, snapshot))
    }
}

fn require_file(path: &Path, kind: &'static str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(StampError::NotFound {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Removes proof files created during a submission unless disarmed.
///
/// Files that already existed when tracking started are left alone.
#[derive(Default)]
struct ProofGuard {
    created: Vec<PathBuf>,
    armed: bool,
}

impl ProofGuard {
    fn track(&mut self, path: &Path) {
        self.armed = true;
        if !path.exists() && !self.created.iter().any(|p| p == path) {
            self.created.push(path.to_path_buf());
        }
    }

    /// Track a file the authority has just written, even though it now exists.
    fn track_created(&mut self, path: &Path) {
        self.armed = true;
        if !self.created.iter().any(|p| p == path) {
            self.created.push(path.to_path_buf());
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ProofGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in &self.created {
            if path.exists() {
                warn!(proof = %path.display(), "removing incomplete proof");
                fs::remove_file(path).ok();
            }
        }
    }
}
