//! OpenTimestamps authority backed by the `ots` command-line client.

use crate::authority::{ProofAuthority, Submission};
use crate::config::StampConfig;
use crate::error::{Result, StampError, OTS_INSTALL_HINT};
use crate::process::{run_with_deadline, ProcessOutput, RunError};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, warn};

/// Slack given to the `ots` process on top of its own `--timeout`.
const DEFAULT_GRACE: Duration = Duration::from_secs(60);

/// Bound on `ots --version` when checking availability.
const DEFAULT_VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives the `ots` executable.
///
/// `ots stamp` writes its proof to `<file>.ots`; verification passes the
/// stamped file explicitly with `-f` so the proof may live anywhere.
#[derive(Debug, Clone)]
pub struct OtsAuthority {
    executable: PathBuf,
    calendars: Vec<String>,
    verify_timeout: Duration,
    version_timeout: Duration,
    grace: Duration,
}

impl OtsAuthority {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            calendars: Vec::new(),
            verify_timeout: StampConfig::default().verify_timeout(),
            version_timeout: DEFAULT_VERSION_TIMEOUT,
            grace: DEFAULT_GRACE,
        }
    }

    pub fn from_config(config: &StampConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            calendars: config.calendars.clone(),
            verify_timeout: config.verify_timeout(),
            version_timeout: DEFAULT_VERSION_TIMEOUT,
            grace: DEFAULT_GRACE,
        }
    }

    pub fn with_calendars(mut self, calendars: Vec<String>) -> Self {
        self.calendars = calendars;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn with_version_timeout(mut self, timeout: Duration) -> Self {
        self.version_timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn unavailable(&self) -> StampError {
        StampError::Unavailable {
            executable: self.executable.display().to_string(),
            hint: OTS_INSTALL_HINT,
        }
    }

    fn run(&self, command: Command, operation: &'static str, deadline: Duration) -> Result<ProcessOutput> {
        run_with_deadline(command, deadline).map_err(|err| match err {
            RunError::Spawn(e) if e.kind() == ErrorKind::NotFound => self.unavailable(),
            RunError::Spawn(e) | RunError::Wait(e) => StampError::Io {
                path: self.executable.clone(),
                source: e,
            },
            RunError::TimedOut => StampError::Timeout {
                operation,
                seconds: deadline.as_secs(),
            },
        })
    }
}

impl Default for OtsAuthority {
    fn default() -> Self {
        Self::from_config(&StampConfig::default())
    }
}

/// `<file>.ots`, where `ots stamp` puts its proof.
fn native_proof_path(file: &Path) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(".ots");
    PathBuf::from(name)
}

/// The digest `ots` echoes back, from a line such as `Hash: 5e88...`.
fn parse_reported_hash(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| line.contains("Hash"))
        .find_map(|line| line.split_once(": ").map(|(_, value)| value.trim().to_string()))
        .filter(|value| !value.is_empty())
}

impl ProofAuthority for OtsAuthority {
    fn check_available(&self) -> bool {
        let mut command = Command::new(&self.executable);
        command.arg("--version");
        match run_with_deadline(command, self.version_timeout) {
            Ok(output) => output.status.success(),
            Err(err) => {
                debug!(executable = %self.executable.display(), ?err, "ots not available");
                false
            }
        }
    }

    fn submit(&self, file: &Path, timeout: Duration, min_attestations: u32) -> Result<Submission> {
        let proof_path = native_proof_path(file);
        let preexisting = proof_path.exists();

        let mut command = Command::new(&self.executable);
        command.arg("stamp");
        for calendar in &self.calendars {
            command.arg("-c").arg(calendar);
        }
        command
            .arg("-m")
            .arg(min_attestations.to_string())
            .arg("--timeout")
            .arg(timeout.as_secs().to_string())
            .arg(file);

        let result = self
            .run(command, "stamp", timeout + self.grace)
            .and_then(|output| {
                if !output.status.success() {
                    return Err(StampError::Operation {
                        operation: "stamp",
                        diagnostic: output.diagnostic(),
                    });
                }
                if !proof_path.is_file() {
                    return Err(StampError::Operation {
                        operation: "stamp",
                        diagnostic: format!(
                            "ots exited successfully but wrote no proof at {}",
                            proof_path.display()
                        ),
                    });
                }
                Ok(output)
            });

        match result {
            Ok(output) => {
                let reported_hash = parse_reported_hash(&output.combined());
                debug!(proof = %proof_path.display(), ?reported_hash, "ots stamp finished");
                Ok(Submission {
                    proof_path,
                    reported_hash,
                })
            }
            Err(err) => {
                if !preexisting && proof_path.exists() {
                    warn!(proof = %proof_path.display(), "removing partial proof");
                    fs::remove_file(&proof_path).ok();
                }
                Err(err)
            }
        }
    }

    fn verify(&self, file: &Path, proof: &Path) -> Result<String> {
        let mut command = Command::new(&self.executable);
        command.arg("verify").arg("-f").arg(file).arg(proof);

        let output = self.run(command, "verify", self.verify_timeout)?;
        if output.status.success() {
            Ok(output.combined())
        } else {
            Ok(output.diagnostic())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_native_proof_path_appends_extension() {
        assert_eq!(
            native_proof_path(Path::new("glyphs/G_manifest.json")),
            PathBuf::from("glyphs/G_manifest.json.ots")
        );
    }

    #[test]
    fn test_parse_reported_hash() {
        let output = "Submitting to remote calendar\nHash: 5e88489\nDone";
        assert_eq!(parse_reported_hash(output).as_deref(), Some("5e88489"));
        assert_eq!(parse_reported_hash("nothing useful"), None);
    }

    #[test]
    fn test_missing_executable_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("m.json");
        fs::write(&file, "{}").unwrap();

        let authority = OtsAuthority::new(dir.path().join("no-such-ots"));
        assert!(!authority.check_available());

        let result = authority.submit(&file, Duration::from_secs(5), 2);
        assert!(matches!(result, Err(StampError::Unavailable { .. })));
        assert!(!native_proof_path(&file).exists());

        let result = authority.verify(&file, &native_proof_path(&file));
        assert!(matches!(result, Err(StampError::Unavailable { .. })));
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable stand-in for `ots` whose behaviour is driven by `body`.
        fn fake_ots(dir: &TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("ots");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        const HAPPY: &str = r#"case "$1" in
  --version) echo "v0.7.2"; exit 0 ;;
  stamp) for last; do :; done; printf 'proof' > "$last.ots"; echo "Hash: abc123" >&2; exit 0 ;;
  verify) echo "Success! Bitcoin block 358391 attests existence as of 2015-05-28 CEST" >&2; exit 0 ;;
esac
exit 2"#;

        fn manifest(dir: &TempDir) -> PathBuf {
            let file = dir.path().join("m.json");
            fs::write(&file, "{}").unwrap();
            file
        }

        #[test]
        fn test_stamp_and_verify_through_script() {
            let dir = TempDir::new().unwrap();
            let authority = OtsAuthority::new(fake_ots(&dir, HAPPY));
            let file = manifest(&dir);

            assert!(authority.check_available());
            let submission = authority.submit(&file, Duration::from_secs(5), 2).unwrap();
            assert_eq!(submission.proof_path, native_proof_path(&file));
            assert_eq!(submission.reported_hash.as_deref(), Some("abc123"));

            let output = authority.verify(&file, &submission.proof_path).unwrap();
            assert!(output.contains("Success! Bitcoin block"));
        }

        #[test]
        fn test_stamp_arguments() {
            let dir = TempDir::new().unwrap();
            let log = dir.path().join("args.log");
            let body = format!(
                "echo \"$@\" > '{}'\nfor last; do :; done\nprintf p > \"$last.ots\"",
                log.display()
            );
            let authority = OtsAuthority::new(fake_ots(&dir, &body))
                .with_calendars(vec!["https://cal.example".to_string()]);
            let file = manifest(&dir);

            authority.submit(&file, Duration::from_secs(1800), 2).unwrap();
            let args = fs::read_to_string(&log).unwrap();
            assert_eq!(
                args.trim(),
                format!("stamp -c https://cal.example -m 2 --timeout 1800 {}", file.display())
            );
        }

        #[test]
        fn test_failed_stamp_removes_partial_proof() {
            let dir = TempDir::new().unwrap();
            let body = "for last; do :; done\nprintf half > \"$last.ots\"\necho 'calendar unreachable' >&2\nexit 1";
            let authority = OtsAuthority::new(fake_ots(&dir, body));
            let file = manifest(&dir);

            match authority.submit(&file, Duration::from_secs(5), 2) {
                Err(StampError::Operation { diagnostic, .. }) => {
                    assert_eq!(diagnostic, "calendar unreachable")
                }
                other => panic!("expected operation error, got {other:?}"),
            }
            assert!(!native_proof_path(&file).exists());
        }

        #[test]
        fn test_success_without_proof_is_operation_error() {
            let dir = TempDir::new().unwrap();
            let authority = OtsAuthority::new(fake_ots(&dir, "exit 0"));
            let file = manifest(&dir);
            assert!(matches!(
                authority.submit(&file, Duration::from_secs(5), 2),
                Err(StampError::Operation { .. })
            ));
        }

        #[test]
        fn test_stamp_timeout() {
            let dir = TempDir::new().unwrap();
            let authority = OtsAuthority::new(fake_ots(&dir, "sleep 5")).with_grace(Duration::ZERO);
            let file = manifest(&dir);
            assert!(matches!(
                authority.submit(&file, Duration::from_secs(1), 2),
                Err(StampError::Timeout { operation: "stamp", seconds: 1 })
            ));
        }

        #[test]
        fn test_hung_version_check_is_unavailable() {
            let dir = TempDir::new().unwrap();
            let authority = OtsAuthority::new(fake_ots(&dir, "sleep 5"))
                .with_version_timeout(Duration::from_millis(200));

            let started = std::time::Instant::now();
            assert!(!authority.check_available());
            assert!(started.elapsed() < Duration::from_secs(5));
        }

        #[test]
        fn test_failing_version_check_is_unavailable() {
            let dir = TempDir::new().unwrap();
            let authority = OtsAuthority::new(fake_ots(&dir, "exit 1"));
            assert!(!authority.check_available());
        }

        #[test]
        fn test_rejected_proof_returns_diagnostic() {
            let dir = TempDir::new().unwrap();
            let body = "echo 'Error! invalid ots data' >&2\nexit 1";
            let authority = OtsAuthority::new(fake_ots(&dir, body));
            let file = manifest(&dir);
            let proof = dir.path().join("m.ots");
            fs::write(&proof, "invalid ots data").unwrap();

            let output = authority.verify(&file, &proof).unwrap();
            assert_eq!(output, "Error! invalid ots data");
        }
    }
}
