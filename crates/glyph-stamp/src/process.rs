//! Bounded subprocess execution.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

pub(crate) struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Non-empty output streams, stdout first, joined by a newline.
    pub fn combined(&self) -> String {
        [self.stdout.trim(), self.stderr.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// What the process had to say about a failure, preferring stderr.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("process exited with {}", self.status)
    }
}

#[derive(Debug)]
pub(crate) enum RunError {
    Spawn(io::Error),
    Wait(io::Error),
    TimedOut,
}

/// Run `command` to completion, killing it once `deadline` has elapsed.
///
/// Output is captured in anonymous temporary files so a chatty child can
/// never block on a full pipe while we wait.
pub(crate) fn run_with_deadline(mut command: Command, deadline: Duration) -> Result<ProcessOutput, RunError> {
    let mut stdout = tempfile::tempfile().map_err(RunError::Spawn)?;
    let mut stderr = tempfile::tempfile().map_err(RunError::Spawn)?;
    command
        .stdin(Stdio::null())
        .stdout(stdout.try_clone().map_err(RunError::Spawn)?)
        .stderr(stderr.try_clone().map_err(RunError::Spawn)?);

    debug!(command = ?command, deadline_s = deadline.as_secs(), "spawning");
    let mut child = command.spawn().map_err(RunError::Spawn)?;

    let Some(status) = child.wait_timeout(deadline).map_err(RunError::Wait)? else {
        warn!(deadline_s = deadline.as_secs(), "deadline exceeded, killing child");
        let _ = child.kill();
        let _ = child.wait();
        return Err(RunError::TimedOut);
    };

    Ok(ProcessOutput {
        status,
        stdout: read_back(&mut stdout).map_err(RunError::Wait)?,
        stderr: read_back(&mut stderr).map_err(RunError::Wait)?,
    })
}

fn read_back(file: &mut File) -> io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
