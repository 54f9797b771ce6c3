//! # Workflow Coordinator
//!
//! Sequences the agents over one `ResearchState`: research once, then
//! write → edit → gate until the pipeline terminates. Progress events go
//! to an optional channel (the server bridges them to SSE) and are also
//! collected into the run report.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::agents::{EditorAgent, ResearcherAgent, Revision, WriterAgent};
use crate::config::WorkflowConfig;
use crate::models::{LanguageModel, RigModel};
use crate::tools::{SearchProvider, SearxngSearch};
use crate::workflow::events::{RunEvent, RunEventKind};
use crate::workflow::pipeline::{GateDecision, Pipeline};
use crate::workflow::state::ResearchState;

/// Outcome of one run: the full state, the events it emitted, and
/// whether a report was produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: ResearchState,
    pub events: Vec<RunEvent>,
    pub success: bool,
}

/// Drives the research workflow.
pub struct Coordinator {
    config: WorkflowConfig,
    llm: Box<dyn LanguageModel>,
    search: Box<dyn SearchProvider>,
    event_tx: Option<mpsc::Sender<RunEvent>>,
}

impl Coordinator {
    /// Build a coordinator with production collaborators. Validates the
    /// config up front so runs never start half-configured.
    pub fn new(config: WorkflowConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let llm = RigModel::new(&config.model, config.llm_timeout_secs)
            .context("failed to build LLM client")?;
        let search = SearxngSearch::new(config.searxng_url.as_deref(), config.search_timeout_secs)
            .context("failed to build search client")?;

        Ok(Self {
            config,
            llm: Box::new(llm),
            search: Box::new(search),
            event_tx: None,
        })
    }

    /// Build a coordinator with explicit collaborators. Test seam; also
    /// what a caller with its own providers would use.
    pub fn with_collaborators(
        config: WorkflowConfig,
        llm: Box<dyn LanguageModel>,
        search: Box<dyn SearchProvider>,
    ) -> Self {
        Self {
            config,
            llm,
            search,
            event_tx: None,
        }
    }

    /// Attach a channel that receives progress events as they happen.
    pub fn with_event_channel(mut self, tx: mpsc::Sender<RunEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Run the full workflow for a topic.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, topic: &str) -> RunReport {
        let mut state = ResearchState::new(topic);
        let mut pipeline = Pipeline::new(self.config.max_revisions);
        let mut events = Vec::new();

        self.emit(
            &mut events,
            RunEvent::new(RunEventKind::RunStarted, "coordinator")
                .with_data(json!({"topic": topic})),
        )
        .await;

        match self.execute(&mut state, &mut pipeline, &mut events).await {
            Ok(()) => {
                self.emit(
                    &mut events,
                    RunEvent::new(RunEventKind::RunCompleted, "coordinator").with_data(json!({
                        "quality_score": state.quality_score,
                        "revisions": state.revision_count,
                    })),
                )
                .await;
            }
            Err(e) => {
                tracing::error!(error = %e, "run failed");
                pipeline.fail();
                state.current_stage = pipeline.stage;
                self.emit(
                    &mut events,
                    RunEvent::new(RunEventKind::RunFailed, "coordinator")
                        .with_data(json!({"error": format!("{:#}", e)})),
                )
                .await;
            }
        }

        let success = pipeline.is_success();
        RunReport {
            state,
            events,
            success,
        }
    }

    async fn execute(
        &self,
        state: &mut ResearchState,
        pipeline: &mut Pipeline,
        events: &mut Vec<RunEvent>,
    ) -> Result<()> {
        // Research happens once per run.
        self.emit(events, RunEvent::new(RunEventKind::StepStarted, "researcher"))
            .await;
        let findings = ResearcherAgent::run(
            self.llm.as_ref(),
            self.search.as_ref(),
            &state.topic,
            self.config.max_search_results,
        )
        .await
        .context("research step failed")?;

        state.search_queries = findings.queries;
        state.search_results = findings.results;
        state.research_notes = findings.notes;
        pipeline.advance();
        state.current_stage = pipeline.stage;
        self.emit(
            events,
            RunEvent::new(RunEventKind::StepCompleted, "researcher").with_data(json!({
                "queries": state.search_queries,
                "results": state.search_results.len(),
            })),
        )
        .await;

        // Write → edit → gate until the pipeline terminates.
        loop {
            self.emit(events, RunEvent::new(RunEventKind::StepStarted, "writer"))
                .await;
            let revision = state.feedback.as_ref().map(|feedback| Revision {
                prior_draft: state.draft_report.clone(),
                feedback: feedback.clone(),
            });
            state.draft_report = WriterAgent::run(
                self.llm.as_ref(),
                &state.topic,
                &state.research_notes,
                revision.as_ref(),
            )
            .await
            .context("writing step failed")?;
            pipeline.advance();
            state.current_stage = pipeline.stage;
            self.emit(
                events,
                RunEvent::new(RunEventKind::StepCompleted, "writer").with_data(json!({
                    "chars": state.draft_report.len(),
                    "preview": state.draft_report.chars().take(200).collect::<String>(),
                })),
            )
            .await;

            self.emit(events, RunEvent::new(RunEventKind::StepStarted, "editor"))
                .await;
            let review = EditorAgent::run(
                self.llm.as_ref(),
                &state.topic,
                &state.draft_report,
                self.config.quality_threshold,
            )
            .await
            .context("editing step failed")?;
            state.quality_score = Some(review.quality_score);
            state.feedback = review.feedback;
            self.emit(
                events,
                RunEvent::new(RunEventKind::StepCompleted, "editor")
                    .with_data(json!({"quality_score": review.quality_score})),
            )
            .await;

            match pipeline.review(review.quality_score, self.config.quality_threshold) {
                GateDecision::Finish => {
                    state.revision_count = pipeline.revision_count;
                    state.current_stage = pipeline.stage;
                    state.settle();
                    return Ok(());
                }
                GateDecision::Revise => {
                    state.revision_count = pipeline.revision_count;
                    state.current_stage = pipeline.stage;
                    self.emit(
                        events,
                        RunEvent::new(RunEventKind::RevisionRequested, "coordinator").with_data(
                            json!({
                                "revision": state.revision_count,
                                "quality_score": review.quality_score,
                            }),
                        ),
                    )
                    .await;
                }
            }
        }
    }

    /// Record an event and forward it to the channel if one is attached.
    async fn emit(&self, events: &mut Vec<RunEvent>, event: RunEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event.clone()).await;
        }
        events.push(event);
    }
}
