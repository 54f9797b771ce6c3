//! # Research Workflow
//!
//! The orchestration layer: the stage machine, the per-run state record,
//! progress events, and the coordinator that drives them.

pub mod coordinator;
pub mod events;
pub mod pipeline;
pub mod state;

pub use coordinator::{Coordinator, RunReport};
pub use events::{RunEvent, RunEventKind};
pub use pipeline::{GateDecision, Pipeline, Stage};
pub use state::ResearchState;
