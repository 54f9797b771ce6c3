//! # Workflow Agents
//!
//! The three specialists the coordinator sequences:
//!
//! - `researcher` - queries, web search, notes consolidation
//! - `writer` - compose and revise report drafts
//! - `editor` - score drafts and produce feedback
//!
//! Agents are stateless; each exposes a static `run()` over the
//! collaborator traits and returns plain data. System prompts live in
//! `defaults/` and are bundled via `prompts`.

pub mod editor;
pub mod prompts;
pub mod researcher;
pub mod writer;

pub use editor::{EditorAgent, Review, ReviewScores};
pub use researcher::{QueryResults, ResearchFindings, ResearcherAgent};
pub use writer::{Revision, WriterAgent};
