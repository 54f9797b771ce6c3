//! # Run Events
//!
//! Progress events the coordinator emits while a run executes. The
//! server bridges these onto its SSE stream; the CLI logs them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of run event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunEventKind {
    /// Run accepted, state created
    RunStarted,
    /// A workflow step began
    StepStarted,
    /// A workflow step finished
    StepCompleted,
    /// Gate sent the draft back to the writer
    RevisionRequested,
    /// Report settled, run over
    RunCompleted,
    /// A step failed, run over
    RunFailed,
}

/// One progress event in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    /// Unique event ID
    pub id: String,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Kind of event
    pub kind: RunEventKind,
    /// Step that produced this event ("researcher", "writer", "editor",
    /// or "coordinator")
    pub step: String,
    /// Associated data (JSON)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl RunEvent {
    /// Create a new event
    pub fn new(kind: RunEventKind, step: &str) -> Self {
        Self {
            id: event_id(),
            timestamp: Utc::now(),
            kind,
            step: step.to_string(),
            data: None,
        }
    }

    /// Add data to the event
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Generate a simple unique id
fn event_id() -> String {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos();
    format!("{:x}-{:x}", nanos, rand_u32())
}

/// Simple random number (not cryptographic)
fn rand_u32() -> u32 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    RandomState::new().build_hasher().finish() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = RunEvent::new(RunEventKind::StepStarted, "researcher")
            .with_data(serde_json::json!({"queries": 3}));

        assert_eq!(event.step, "researcher");
        assert_eq!(event.kind, RunEventKind::StepStarted);
        assert!(event.data.is_some());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&RunEventKind::RevisionRequested).unwrap();
        assert_eq!(json, "\"revision_requested\"");
    }
}
