use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// A ranking or routing collaborator failed as a whole.
///
/// Every variant keeps whatever diagnostic text was captured so callers can
/// surface it; there is no partial result to salvage at this boundary.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to encode input for {collaborator}: {source}")]
    Encode {
        collaborator: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to spawn {collaborator}: {source}")]
    Spawn {
        collaborator: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{collaborator} timed out after {secs}s")]
    Timeout {
        collaborator: &'static str,
        secs: u64,
    },

    #[error("{collaborator} exited with status {status:?}")]
    Exit {
        collaborator: &'static str,
        status: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("failed to parse {collaborator} output: {source}")]
    Parse {
        collaborator: &'static str,
        #[source]
        source: serde_json::Error,
        stderr: String,
        raw: String,
    },
}

impl UpstreamError {
    /// Captured diagnostic stream content, if the collaborator produced any.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&str> {
        let text = match self {
            UpstreamError::Exit { stderr, stdout, .. } => {
                if stderr.trim().is_empty() {
                    stdout.as_str()
                } else {
                    stderr.as_str()
                }
            }
            UpstreamError::Parse { stderr, raw, .. } => {
                if stderr.trim().is_empty() {
                    raw.as_str()
                } else {
                    stderr.as_str()
                }
            }
            _ => return None,
        };
        let trimmed = text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
