//! # Editor Agent
//!
//! Scores a draft on four dimensions and produces revision feedback.
//! The model must answer in strict JSON; the parser tolerates prose
//! around the object but nothing else.

use serde::{Deserialize, Serialize};

use super::prompts;
use crate::error::WorkflowError;
use crate::models::LanguageModel;

/// Per-dimension scores, each clamped to [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReviewScores {
    pub clarity: f64,
    pub accuracy: f64,
    pub tone: f64,
    pub citations: f64,
}

impl ReviewScores {
    /// Overall quality: the arithmetic mean of the four dimensions.
    pub fn mean(&self) -> f64 {
        (self.clarity + self.accuracy + self.tone + self.citations) / 4.0
    }
}

/// The editor's verdict on one draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub scores: ReviewScores,
    pub quality_score: f64,
    /// Present only when the draft fell below the threshold.
    pub feedback: Option<String>,
}

/// Wire shape of the model's JSON answer.
#[derive(Deserialize)]
struct RawReview {
    clarity: f64,
    accuracy: f64,
    tone: f64,
    citations: f64,
    #[serde(default)]
    feedback: String,
}

pub struct EditorAgent;

impl EditorAgent {
    /// Review a draft against the quality threshold.
    #[tracing::instrument(skip(llm, draft))]
    pub async fn run(
        llm: &dyn LanguageModel,
        topic: &str,
        draft: &str,
        quality_threshold: f64,
    ) -> Result<Review, WorkflowError> {
        let prompt = format!("Topic: {}\n\nDraft report:\n\n{}", topic, draft);
        let response = llm.generate(prompts::EDITOR_REVIEW, &prompt).await?;

        let raw = parse_review(&response)?;
        let scores = ReviewScores {
            clarity: raw.clarity.clamp(0.0, 1.0),
            accuracy: raw.accuracy.clamp(0.0, 1.0),
            tone: raw.tone.clamp(0.0, 1.0),
            citations: raw.citations.clamp(0.0, 1.0),
        };
        let quality_score = scores.mean();

        // Feedback only matters when another revision pass may happen.
        let feedback = if quality_score < quality_threshold && !raw.feedback.trim().is_empty() {
            Some(raw.feedback)
        } else {
            None
        };

        tracing::info!(quality_score, "draft reviewed");
        Ok(Review {
            scores,
            quality_score,
            feedback,
        })
    }
}

/// Extract the JSON object spanning the first `{` to the last `}`.
fn parse_review(response: &str) -> Result<RawReview, WorkflowError> {
    let start = response.find('{');
    let end = response.rfind('}');
    let span = match (start, end) {
        (Some(s), Some(e)) if s < e => &response[s..=e],
        _ => {
            return Err(WorkflowError::Collaborator {
                collaborator: "language model",
                reason: "review response contained no JSON object".to_string(),
            })
        }
    };

    serde_json::from_str(span).map_err(|e| WorkflowError::Collaborator {
        collaborator: "language model",
        reason: format!("malformed review JSON: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedModel {
        response: &'static str,
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, WorkflowError> {
            Ok(self.response.to_string())
        }
    }

    #[tokio::test]
    async fn test_review_is_mean_of_dimensions() {
        let llm = FixedModel {
            response: r#"{"clarity": 0.8, "accuracy": 0.9, "tone": 0.7, "citations": 0.6, "feedback": "tighten intro"}"#,
        };
        let review = EditorAgent::run(&llm, "topic", "draft", 0.8).await.unwrap();
        assert!((review.quality_score - 0.75).abs() < 1e-9);
        assert_eq!(review.feedback.as_deref(), Some("tighten intro"));
    }

    #[tokio::test]
    async fn test_feedback_dropped_above_threshold() {
        let llm = FixedModel {
            response: r#"{"clarity": 0.9, "accuracy": 0.9, "tone": 0.9, "citations": 0.9, "feedback": "minor nits"}"#,
        };
        let review = EditorAgent::run(&llm, "topic", "draft", 0.8).await.unwrap();
        assert!(review.quality_score >= 0.8);
        assert!(review.feedback.is_none());
    }

    #[tokio::test]
    async fn test_scores_are_clamped() {
        let llm = FixedModel {
            response: r#"{"clarity": 1.7, "accuracy": -0.2, "tone": 0.5, "citations": 0.5}"#,
        };
        let review = EditorAgent::run(&llm, "topic", "draft", 0.8).await.unwrap();
        assert!((review.scores.clarity - 1.0).abs() < f64::EPSILON);
        assert!(review.scores.accuracy.abs() < f64::EPSILON);
        assert!((review.quality_score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_json_extracted_from_surrounding_prose() {
        let llm = FixedModel {
            response: "Here is my review:\n```json\n{\"clarity\": 0.5, \"accuracy\": 0.5, \"tone\": 0.5, \"citations\": 0.5, \"feedback\": \"more sources\"}\n```\nHope that helps.",
        };
        let review = EditorAgent::run(&llm, "topic", "draft", 0.8).await.unwrap();
        assert!((review.quality_score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_json_is_an_error() {
        let llm = FixedModel {
            response: "The draft looks fine to me.",
        };
        let err = EditorAgent::run(&llm, "topic", "draft", 0.8)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no JSON object"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let llm = FixedModel {
            response: r#"{"clarity": "high"}"#,
        };
        assert!(EditorAgent::run(&llm, "topic", "draft", 0.8).await.is_err());
    }
}
