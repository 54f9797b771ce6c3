//! # Draftsmith Tools
//!
//! Deterministic collaborators that back the workflow steps with real
//! external services.
//!
//! ## Modules
//!
//! - `search` - SearXNG-backed web search with instance fallback

pub mod search;

pub use search::{SearchHit, SearchProvider, SearxngSearch};
