//! # Draftsmith Core
//!
//! The "Brain" of Draftsmith - the research workflow, its agents, and
//! the state machine that sequences them.
//!
//! ## Architecture
//!
//! - `agents/` - researcher, writer and editor steps with bundled prompts
//! - `models` - LLM provider configuration and the `LanguageModel` seam
//! - `tools/` - external collaborators (SearXNG web search)
//! - `workflow/` - pipeline, state record, events, coordinator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use draftsmith_core::config::WorkflowConfig;
//! use draftsmith_core::workflow::Coordinator;
//!
//! let config = WorkflowConfig::from_env()?;
//! let coordinator = Coordinator::new(config)?;
//! let report = coordinator.run("The state of async Rust").await;
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod models;
pub mod tools;
pub mod workflow;
