use serde::Serialize;

/// Result of one `(source, key)` worker invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerOutcome {
    Success { payload: serde_json::Value },
    Failure(WorkerFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerFailure {
    pub message: String,
    /// Worker stderr, when any was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Raw worker stdout, kept when it could not be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl WorkerOutcome {
    #[must_use]
    pub fn success(payload: serde_json::Value) -> Self {
        WorkerOutcome::Success { payload }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        WorkerOutcome::Failure(WorkerFailure {
            message: message.into(),
            stderr: None,
            raw: None,
        })
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerOutcome::Success { .. })
    }
}

impl WorkerFailure {
    #[must_use]
    pub fn with_streams(message: impl Into<String>, stdout: &str, stderr: &str) -> Self {
        Self {
            message: message.into(),
            stderr: non_blank(stderr),
            raw: non_blank(stdout),
        }
    }
}

fn non_blank(text: &str) -> Option<String> {
    (!text.trim().is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_streams_drops_blank_streams() {
        let failure = WorkerFailure::with_streams("boom", "", "  \n");
        assert_eq!(failure.stderr, None);
        assert_eq!(failure.raw, None);
    }

    #[test]
    fn failure_serializes_with_status_tag() {
        let json = serde_json::to_value(WorkerOutcome::failure("no products")).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["message"], "no products");
        assert!(json.get("stderr").is_none());
    }
}
