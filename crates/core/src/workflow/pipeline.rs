//! # Pipeline Stages
//!
//! The workflow state machine: linear edges through research, writing
//! and editing, plus the gated back-edge from editing to writing.

use serde::{Deserialize, Serialize};

/// Stage of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Researcher gathering sources and notes
    Researching,
    /// Writer composing or revising the draft
    Writing,
    /// Editor reviewing the draft
    Editing,
    /// Terminal: a report was produced
    Done,
    /// Terminal: a step failed
    Failed,
}

/// What the quality gate decided after an editor pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Loop back to the writer for another revision.
    Revise,
    /// Settle the report and terminate.
    Finish,
}

/// The workflow state machine
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Current stage
    pub stage: Stage,
    /// Revision passes consumed so far
    pub revision_count: u32,
    /// Revision budget; reaching it forces termination
    pub max_revisions: u32,
}

impl Pipeline {
    /// Create a new pipeline with the given revision budget.
    pub fn new(max_revisions: u32) -> Self {
        Self {
            stage: Stage::Researching,
            revision_count: 0,
            max_revisions,
        }
    }

    /// Advance along the linear edges.
    pub fn advance(&mut self) {
        self.stage = match self.stage {
            Stage::Researching => Stage::Writing,
            Stage::Writing => Stage::Editing,
            Stage::Editing => Stage::Done,
            Stage::Done => Stage::Done,
            Stage::Failed => Stage::Failed,
        };
    }

    /// The quality gate, applied after each editor pass. Finishes when
    /// the score clears the threshold or the revision budget is spent;
    /// spending the budget still terminates in `Done` with the best
    /// draft so far.
    pub fn review(&mut self, quality_score: f64, threshold: f64) -> GateDecision {
        if quality_score >= threshold || self.revision_count >= self.max_revisions {
            self.stage = Stage::Done;
            GateDecision::Finish
        } else {
            self.revision_count += 1;
            self.stage = Stage::Writing;
            GateDecision::Revise
        }
    }

    /// Fail the workflow
    pub fn fail(&mut self) {
        self.stage = Stage::Failed;
    }

    /// Check if the workflow has terminated
    pub fn is_complete(&self) -> bool {
        matches!(self.stage, Stage::Done | Stage::Failed)
    }

    /// Check if the workflow produced a report
    pub fn is_success(&self) -> bool {
        self.stage == Stage::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_advance() {
        let mut pipeline = Pipeline::new(2);
        assert_eq!(pipeline.stage, Stage::Researching);

        pipeline.advance();
        assert_eq!(pipeline.stage, Stage::Writing);

        pipeline.advance();
        assert_eq!(pipeline.stage, Stage::Editing);

        pipeline.advance();
        assert_eq!(pipeline.stage, Stage::Done);
        assert!(pipeline.is_complete());
        assert!(pipeline.is_success());
    }

    #[test]
    fn test_gate_finishes_on_good_score() {
        let mut pipeline = Pipeline::new(2);
        pipeline.stage = Stage::Editing;

        assert_eq!(pipeline.review(0.85, 0.8), GateDecision::Finish);
        assert_eq!(pipeline.stage, Stage::Done);
        assert_eq!(pipeline.revision_count, 0);
    }

    #[test]
    fn test_gate_finishes_on_exact_threshold() {
        let mut pipeline = Pipeline::new(2);
        pipeline.stage = Stage::Editing;
        assert_eq!(pipeline.review(0.8, 0.8), GateDecision::Finish);
    }

    #[test]
    fn test_revision_loop_is_bounded() {
        let mut pipeline = Pipeline::new(2);
        pipeline.stage = Stage::Editing;

        // First low score: revise.
        assert_eq!(pipeline.review(0.5, 0.8), GateDecision::Revise);
        assert_eq!(pipeline.stage, Stage::Writing);
        assert_eq!(pipeline.revision_count, 1);

        // Second low score: revise again.
        pipeline.stage = Stage::Editing;
        assert_eq!(pipeline.review(0.5, 0.8), GateDecision::Revise);
        assert_eq!(pipeline.revision_count, 2);

        // Budget spent: the gate terminates in Done, not Failed.
        pipeline.stage = Stage::Editing;
        assert_eq!(pipeline.review(0.5, 0.8), GateDecision::Finish);
        assert_eq!(pipeline.stage, Stage::Done);
        assert!(pipeline.is_success());
        assert_eq!(pipeline.revision_count, 2);
    }

    #[test]
    fn test_zero_budget_finishes_immediately() {
        let mut pipeline = Pipeline::new(0);
        pipeline.stage = Stage::Editing;
        assert_eq!(pipeline.review(0.1, 0.8), GateDecision::Finish);
        assert!(pipeline.is_success());
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut pipeline = Pipeline::new(2);
        pipeline.fail();
        assert_eq!(pipeline.stage, Stage::Failed);
        assert!(pipeline.is_complete());
        assert!(!pipeline.is_success());

        pipeline.advance();
        assert_eq!(pipeline.stage, Stage::Failed);
    }
}
