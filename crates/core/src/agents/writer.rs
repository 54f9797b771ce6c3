//! # Writer Agent
//!
//! Composes the report draft from research notes, or revises a prior
//! draft against editor feedback. Compose and revise share one entry
//! point and differ only in the prompt.

use super::prompts;
use crate::error::WorkflowError;
use crate::models::LanguageModel;

/// A revision request: the prior draft plus the feedback to address.
#[derive(Debug, Clone)]
pub struct Revision {
    pub prior_draft: String,
    pub feedback: String,
}

pub struct WriterAgent;

impl WriterAgent {
    /// Produce a draft. `revision` selects the revise template; `None`
    /// composes from scratch.
    #[tracing::instrument(skip(llm, notes, revision))]
    pub async fn run(
        llm: &dyn LanguageModel,
        topic: &str,
        notes: &str,
        revision: Option<&Revision>,
    ) -> Result<String, WorkflowError> {
        let (system, prompt) = match revision {
            None => (
                prompts::WRITER_COMPOSE,
                format!("Topic: {}\n\nResearch notes:\n\n{}", topic, notes),
            ),
            Some(rev) => (
                prompts::WRITER_REVISE,
                format!(
                    "Topic: {}\n\nResearch notes:\n\n{}\n\nCurrent draft:\n\n{}\n\nEditor feedback:\n\n{}",
                    topic, notes, rev.prior_draft, rev.feedback
                ),
            ),
        };

        let draft = llm.generate(system, &prompt).await?;
        if draft.trim().is_empty() {
            return Err(WorkflowError::Collaborator {
                collaborator: "language model",
                reason: "empty draft".to_string(),
            });
        }

        tracing::info!(
            chars = draft.len(),
            revising = revision.is_some(),
            "draft produced"
        );
        Ok(draft)
    }
}
