//! Whole-request external collaborators (pharmacy ranking, route planning).
//!
//! Unlike per-key workers these have no partial result: the process gets a
//! single JSON argument, and either prints one JSON document and exits
//! cleanly or the call fails with an [`UpstreamError`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::process::Command;

use crate::error::UpstreamError;
use crate::process::{run_captured, timeout_from_secs, RunError};

#[derive(Debug, Clone)]
pub struct Collaborator {
    name: &'static str,
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl Collaborator {
    #[must_use]
    pub fn new(
        name: &'static str,
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name,
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    /// The pharmacy-ranking script from the application config.
    #[must_use]
    pub fn ranking(config: &medorch_core::AppConfig) -> Self {
        Self::new(
            "ranking",
            config.python_path.clone(),
            [config.ranking_script.display().to_string()],
        )
        .with_timeout_secs(config.worker_timeout_secs)
    }

    /// The route-planning script from the application config.
    #[must_use]
    pub fn routing(config: &medorch_core::AppConfig) -> Self {
        Self::new(
            "routing",
            config.python_path.clone(),
            [config.routing_script.display().to_string()],
        )
        .with_timeout_secs(config.worker_timeout_secs)
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = timeout_from_secs(secs);
        self
    }

    /// Run the collaborator with `input` as its sole JSON argument.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the input cannot be encoded, the process
    /// cannot be spawned or times out, exits non-zero, or prints something
    /// that does not decode into `O`.
    pub async fn invoke_json<I, O>(&self, input: &I) -> Result<O, UpstreamError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let collaborator = self.name;
        let argument = serde_json::to_string(input)
            .map_err(|source| UpstreamError::Encode { collaborator, source })?;

        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(argument);

        let output = run_captured(command, self.timeout)
            .await
            .map_err(|e| match e {
                RunError::Spawn(source) => UpstreamError::Spawn { collaborator, source },
                RunError::Timeout(limit) => UpstreamError::Timeout {
                    collaborator,
                    secs: limit.as_secs(),
                },
            })?;

        if !output.stderr.trim().is_empty() {
            tracing::warn!(
                collaborator,
                stderr = output.stderr.trim(),
                "collaborator wrote to stderr"
            );
        }

        if !output.success {
            return Err(UpstreamError::Exit {
                collaborator,
                status: output.code,
                stderr: output.stderr,
                stdout: output.stdout,
            });
        }

        match serde_json::from_str(&output.stdout) {
            Ok(parsed) => Ok(parsed),
            Err(source) => Err(UpstreamError::Parse {
                collaborator,
                source,
                stderr: output.stderr,
                raw: output.stdout,
            }),
        }
    }
}
