//! # Research State
//!
//! The single mutable record threaded through the workflow. One instance
//! per run, owned by the coordinator; every step reads what it needs and
//! writes its output back here.

use serde::{Deserialize, Serialize};

use crate::agents::QueryResults;
use crate::workflow::pipeline::Stage;

/// Everything a run accumulates, from topic to final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchState {
    /// The topic under research.
    pub topic: String,
    /// Queries the researcher generated.
    pub search_queries: Vec<String>,
    /// Results for the queries that succeeded.
    pub search_results: Vec<QueryResults>,
    /// Consolidated research notes.
    pub research_notes: String,
    /// Latest writer draft.
    pub draft_report: String,
    /// Settled report; set exactly once, at termination.
    pub final_report: Option<String>,
    /// Latest editor score, in [0, 1].
    pub quality_score: Option<f64>,
    /// Latest editor feedback, present only below the threshold.
    pub feedback: Option<String>,
    /// Revision passes consumed.
    pub revision_count: u32,
    /// Current workflow stage.
    pub current_stage: Stage,
}

impl ResearchState {
    /// Fresh state for a new run.
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            search_queries: Vec::new(),
            search_results: Vec::new(),
            research_notes: String::new(),
            draft_report: String::new(),
            final_report: None,
            quality_score: None,
            feedback: None,
            revision_count: 0,
            current_stage: Stage::Researching,
        }
    }

    /// Settle the final report from the current draft. Idempotent: the
    /// first settlement wins.
    pub fn settle(&mut self) {
        if self.final_report.is_none() {
            self.final_report = Some(self.draft_report.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = ResearchState::new("rust async");
        assert_eq!(state.topic, "rust async");
        assert_eq!(state.current_stage, Stage::Researching);
        assert!(state.final_report.is_none());
        assert_eq!(state.revision_count, 0);
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut state = ResearchState::new("topic");
        state.draft_report = "v1".to_string();
        state.settle();
        assert_eq!(state.final_report.as_deref(), Some("v1"));

        state.draft_report = "v2".to_string();
        state.settle();
        assert_eq!(state.final_report.as_deref(), Some("v1"));
    }

    #[test]
    fn test_state_serializes_round_trip() {
        let mut state = ResearchState::new("topic");
        state.quality_score = Some(0.9);
        let json = serde_json::to_string(&state).unwrap();
        let back: ResearchState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.quality_score, Some(0.9));
        assert_eq!(back.current_stage, Stage::Researching);
    }
}
