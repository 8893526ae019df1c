//! Timestamp proofs for glyph manifests.
//!
//! The [`TimestampClient`] bridges a manifest on disk and an external
//! timestamping authority. Authorities plug in through the
//! [`ProofAuthority`] trait; [`OtsAuthority`] drives the OpenTimestamps
//! `ots` command-line client.
//!
//! Proof creation moves through `Idle -> Submitting -> Proven | Failed`.
//! A failed submission never leaves a proof file behind, and a proof that
//! does not validate is reported as a [`Verification`] with `valid: false`
//! rather than as an error.
//!
//! # Example
//!
//! ```no_run
//! use glyph_stamp::{StampConfig, TimestampClient};
//! use std::path::Path;
//!
//! let client = TimestampClient::ots(StampConfig::default());
//! let outcome = client.stamp_manifest(Path::new("glyphs/GLYPH-TEST_manifest.json"))?;
//! println!("proof: {}", outcome.receipt.proof_path.display());
//! println!("valid: {}", outcome.verification.valid);
//! # Ok::<(), glyph_stamp::StampError>(())
//! ```

mod authority;
mod client;
mod config;
mod error;
mod ots;
mod process;

pub use authority::{ProofAuthority, Submission};
pub use client::{StampOutcome, StampReceipt, TimestampClient, Verification};
pub use config::StampConfig;
pub use error::{Result, StampError};
pub use ots::OtsAuthority;
