//! Run one external process to completion and capture both streams.

use std::time::Duration;

use tokio::process::Command;

#[derive(Debug, Clone)]
pub(crate) struct CapturedOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub(crate) enum RunError {
    Spawn(std::io::Error),
    Timeout(Duration),
}

/// Spawn `command`, wait for exit, and collect stdout and stderr.
///
/// With a `timeout`, the child is killed once it elapses.
pub(crate) async fn run_captured(
    mut command: Command,
    timeout: Option<Duration>,
) -> Result<CapturedOutput, RunError> {
    command.kill_on_drop(true);

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, command.output())
            .await
            .map_err(|_| RunError::Timeout(limit))?,
        None => command.output().await,
    }
    .map_err(RunError::Spawn)?;

    Ok(CapturedOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// `None` for zero, matching the "0 disables" convention of the config.
pub(crate) fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
