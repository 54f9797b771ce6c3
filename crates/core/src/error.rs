//! # Workflow Errors
//!
//! Typed error taxonomy for collaborator calls and configuration.
//! Revision-limit exhaustion is deliberately absent: hitting the cap is a
//! normal termination path through the gate, not a failure.

use thiserror::Error;

/// Errors surfaced by the research workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A model or search call exceeded its configured timeout.
    #[error("{collaborator} call timed out after {seconds}s")]
    CollaboratorTimeout {
        collaborator: &'static str,
        seconds: u64,
    },

    /// A collaborator returned an error or an unusable response.
    #[error("{collaborator} call failed: {reason}")]
    Collaborator {
        collaborator: &'static str,
        reason: String,
    },

    /// Missing or invalid settings, detected before any run begins.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl WorkflowError {
    /// True when the error was a per-call timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WorkflowError::CollaboratorTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = WorkflowError::CollaboratorTimeout {
            collaborator: "language model",
            seconds: 60,
        };
        assert_eq!(err.to_string(), "language model call timed out after 60s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_collaborator_display() {
        let err = WorkflowError::Collaborator {
            collaborator: "web search",
            reason: "all 5 queries failed".to_string(),
        };
        assert!(err.to_string().contains("web search"));
        assert!(!err.is_timeout());
    }
}
