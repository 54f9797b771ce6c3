//! # Agent Prompts
//!
//! System prompts for the workflow agents, bundled at compile time from
//! `defaults/`. Edit the markdown files to tune agent behavior.

/// Researcher: turn a topic into focused search queries.
pub const RESEARCHER_QUERIES: &str = include_str!("defaults/researcher_queries.md");

/// Researcher: consolidate raw search results into notes.
pub const RESEARCHER_NOTES: &str = include_str!("defaults/researcher_notes.md");

/// Writer: compose the first draft from research notes.
pub const WRITER_COMPOSE: &str = include_str!("defaults/writer_compose.md");

/// Writer: revise a draft against editorial feedback.
pub const WRITER_REVISE: &str = include_str!("defaults/writer_revise.md");

/// Editor: score a draft and produce feedback.
pub const EDITOR_REVIEW: &str = include_str!("defaults/editor_review.md");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_bundled() {
        for prompt in [
            RESEARCHER_QUERIES,
            RESEARCHER_NOTES,
            WRITER_COMPOSE,
            WRITER_REVISE,
            EDITOR_REVIEW,
        ] {
            assert!(!prompt.trim().is_empty());
        }
    }

    #[test]
    fn test_editor_prompt_names_all_dimensions() {
        for dim in ["clarity", "accuracy", "tone", "citations"] {
            assert!(EDITOR_REVIEW.contains(dim));
        }
    }
}
