use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Remote command whose output feeds the usage pipeline.
const DF_COMMAND: &str = "df -h";

/// Returned when the remote host yields neither stdout nor stderr.
const EMPTY_OUTPUT_PLACEHOLDER: &str = "Command executed with no output.";

#[derive(Debug, Error)]
#[error("Login Failed: {reason}")]
pub struct FetchError {
    pub reason: String,
}

/// Source of raw df reports. The production impl shells out over SSH;
/// tests substitute a canned fake.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_report(
        &self,
        username: &str,
        password: &str,
        host: &str,
    ) -> Result<String, FetchError>;
}

/// Fetches `df -h` from a remote host by spawning `sshpass`/`ssh`.
///
/// The password travels via the SSHPASS environment variable (`sshpass -e`)
/// so it never appears in the process list. Host keys are auto-accepted,
/// matching the interactive workflow this replaces; connection timeouts are
/// whatever ssh defaults to.
pub struct SshCollector;

#[async_trait]
impl ReportSource for SshCollector {
    async fn fetch_report(
        &self,
        username: &str,
        password: &str,
        host: &str,
    ) -> Result<String, FetchError> {
        let output = Command::new("sshpass")
            .args([
                "-e",
                "ssh",
                "-o", "StrictHostKeyChecking=no",
                "-o", "UserKnownHostsFile=/dev/null",
                &format!("{username}@{host}"),
                DF_COMMAND,
            ])
            .env("SSHPASS", password)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FetchError { reason: format!("cannot spawn sshpass: {e}") })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let reason = if stderr.trim().is_empty() {
                format!("ssh exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(FetchError { reason });
        }

        debug!(host, bytes = stdout.len(), "fetched df report");
        Ok(select_output(stdout, stderr))
    }
}

/// df writes its table to stdout; fall back to stderr so a remote-side
/// complaint still reaches the user, then to a fixed placeholder.
fn select_output(stdout: String, stderr: String) -> String {
    if !stdout.trim().is_empty() {
        stdout
    } else if !stderr.trim().is_empty() {
        stderr
    } else {
        EMPTY_OUTPUT_PLACEHOLDER.to_string()
    }
}
