//! Timestamp client configuration.

use crate::error::{Result, StampError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunables for proof creation and verification.
///
/// Every key is optional in a TOML file; missing keys keep their defaults.
///
/// ```toml
/// executable = "/usr/local/bin/ots"
/// timeout_secs = 600
/// min_attestations = 3
/// calendars = ["https://a.pool.opentimestamps.org"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    /// Authority executable (default: `ots`, resolved through `PATH`)
    pub executable: PathBuf,
    /// Upper bound for a submission (default: 1800)
    pub timeout_secs: u64,
    /// Upper bound for a verification round trip (default: 300)
    pub verify_timeout_secs: u64,
    /// Independent attestations requested per submission (default: 2)
    pub min_attestations: u32,
    /// Calendar servers to submit to; empty means the client's own defaults
    pub calendars: Vec<String>,
    /// Text whose presence in verification output means the proof holds
    pub success_marker: String,
    /// Extension of the proof file written next to a manifest (default: `ots`)
    pub proof_extension: String,
}

impl Default for StampConfig {
    fn default() -> Self {
        StampConfig {
            executable: PathBuf::from("ots"),
            timeout_secs: 1800,
            verify_timeout_secs: 300,
            min_attestations: 2,
            calendars: Vec::new(),
            success_marker: "Success! Bitcoin block".to_string(),
            proof_extension: "ots".to_string(),
        }
    }
}

impl StampConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }

    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => StampError::NotFound {
                kind: "config file",
                path: path.to_path_buf(),
            },
            _ => StampError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_toml_str(&text).map_err(|e| StampError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StampConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(1800));
        assert_eq!(config.min_attestations, 2);
        assert_eq!(config.executable, PathBuf::from("ots"));
        assert_eq!(config.proof_extension, "ots");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StampConfig::from_toml_str("timeout_secs = 60\nmin_attestations = 3\n").unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.min_attestations, 3);
        assert_eq!(config.success_marker, "Success! Bitcoin block");
    }

    #[test]
    fn test_calendars_from_toml() {
        let config = StampConfig::from_toml_str(
            r#"calendars = ["https://a.pool.opentimestamps.org", "https://b.pool.opentimestamps.org"]"#,
        )
        .unwrap();
        assert_eq!(config.calendars.len(), 2);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "timeout_secs = \"soon\"").unwrap();
        assert!(matches!(
            StampConfig::from_toml_file(file.path()),
            Err(StampError::Config { .. })
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            StampConfig::from_toml_file(dir.path().join("glyphchain.toml")),
            Err(StampError::NotFound { .. })
        ));
    }
}
