//! Glyph manifests, echo logs and their on-disk forms.
//!
//! This crate provides the [`Manifest`] ("glyph") record with its mutation
//! operations and canonical form, the append-only [`EchoLog`] journal, and
//! ZIP bundle export for sharing a manifest together with its log.
//!
//! # Example
//!
//! ```
//! use glyph_model::{Manifest, DEFAULT_TRUTH_ANCHOR};
//!
//! let mut glyph = Manifest::new(
//!     "GLYPH-TEST",
//!     "Test Glyph",
//!     "UnitTester",
//!     vec!["Concept1".to_string(), "Concept2".to_string()],
//!     DEFAULT_TRUTH_ANCHOR,
//! );
//! glyph.set_dedication("Test dedication", "UnitTester");
//! glyph.set_closing(vec!["Line one".to_string(), "Line two".to_string()]);
//!
//! assert_eq!(glyph.digest(), glyph.clone().digest());
//! ```

mod bundle;
mod echo;
mod error;
mod files;
mod manifest;
mod timestamp;

pub use bundle::{default_bundle_path, export_bundle};
pub use echo::{EchoAnnotations, EchoEntry, EchoLog};
pub use error::{ModelError, Result};
pub use manifest::{Dedication, ExtraValue, Manifest, RegistryEntry, DEFAULT_TRUTH_ANCHOR};
pub use timestamp::{format_timestamp, now_utc, parse_timestamp, TIMESTAMP_FORMAT};
