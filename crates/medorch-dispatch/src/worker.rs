//! External per-key workers.
//!
//! [`ProcessWorker`] runs `<program> <args..> <mode> <key>` and expects a
//! single JSON document on stdout shaped like
//! `{ "medicine": key, "<mode>": payload | null, "error": string | null }`.
//! Anything else becomes a [`WorkerOutcome::Failure`] for that one key.

use std::future::Future;
use std::time::Duration;

use tokio::process::Command;

use crate::outcome::{WorkerFailure, WorkerOutcome};
use crate::process::{run_captured, timeout_from_secs, CapturedOutput, RunError};
use crate::source::SourceId;

/// Resolves one key against one source.
///
/// Implementations must fold every failure into the returned outcome; a
/// worker never fails the batch it belongs to.
pub trait Worker: Send + Sync {
    fn invoke(&self, source: SourceId, key: &str) -> impl Future<Output = WorkerOutcome> + Send;
}

/// Worker backed by one external process per invocation.
#[derive(Debug, Clone)]
pub struct ProcessWorker {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessWorker {
    /// `args` are passed before the mode and key, typically the script path.
    #[must_use]
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    /// Build the scraper worker described by the application config.
    #[must_use]
    pub fn from_config(config: &medorch_core::AppConfig) -> Self {
        Self::new(
            config.python_path.clone(),
            [config.scraper_script.display().to_string()],
        )
        .with_timeout_secs(config.worker_timeout_secs)
    }

    /// `0` disables the timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = timeout_from_secs(secs);
        self
    }

    fn command(&self, source: SourceId, key: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(source.mode()).arg(key);
        command
    }
}

impl Worker for ProcessWorker {
    async fn invoke(&self, source: SourceId, key: &str) -> WorkerOutcome {
        let outcome = match run_captured(self.command(source, key), self.timeout).await {
            Ok(captured) => {
                if !captured.stderr.trim().is_empty() {
                    tracing::warn!(
                        source = %source,
                        key,
                        stderr = captured.stderr.trim(),
                        "worker wrote to stderr"
                    );
                }
                interpret_worker_output(source, &captured.into())
            }
            Err(RunError::Spawn(e)) => {
                WorkerOutcome::failure(format!("failed to spawn worker: {e}"))
            }
            Err(RunError::Timeout(limit)) => {
                WorkerOutcome::failure(format!("worker timed out after {}s", limit.as_secs()))
            }
        };

        if let WorkerOutcome::Failure(failure) = &outcome {
            tracing::warn!(
                source = %source,
                key,
                error = failure.message.as_str(),
                "worker lookup failed"
            );
        } else {
            tracing::debug!(source = %source, key, "worker lookup succeeded");
        }

        outcome
    }
}

/// Captured process result, as handed to [`interpret_worker_output`].
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<CapturedOutput> for WorkerOutput {
    fn from(captured: CapturedOutput) -> Self {
        Self {
            success: captured.success,
            code: captured.code,
            stdout: captured.stdout,
            stderr: captured.stderr,
        }
    }
}

/// Turn a finished worker's exit status and streams into an outcome.
///
/// Checked in order: exit status, JSON shape, the worker's own `error`
/// field, then the `<mode>` payload field. The echoed `medicine` field is
/// ignored; callers match outcomes by the key they dispatched.
#[must_use]
pub fn interpret_worker_output(source: SourceId, output: &WorkerOutput) -> WorkerOutcome {
    if !output.success {
        let status = output
            .code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        return WorkerOutcome::Failure(WorkerFailure::with_streams(
            format!("worker exited with status {status}"),
            &output.stdout,
            &output.stderr,
        ));
    }

    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&output.stdout) else {
        return WorkerOutcome::Failure(WorkerFailure::with_streams(
            "Failed to parse scraper output",
            &output.stdout,
            &output.stderr,
        ));
    };

    if let Some(message) = parsed.get("error").and_then(error_message) {
        return WorkerOutcome::failure(message);
    }

    match parsed.get(source.mode()) {
        Some(payload) if !payload.is_null() => WorkerOutcome::success(payload.clone()),
        _ => WorkerOutcome::failure(format!("worker returned no {} payload", source.mode())),
    }
}

fn error_message(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
