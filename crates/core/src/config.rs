//! # Workflow Configuration
//!
//! One immutable record of everything the coordinator needs: model
//! settings plus the workflow knobs (search cap, revision budget, quality
//! threshold, timeouts). Loaded from the environment once at startup and
//! passed into the coordinator constructor; nothing reads ambient state
//! after that.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::models::ModelConfig;

/// Configuration for one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// LLM provider, model and sampling settings.
    pub model: ModelConfig,
    /// Maximum search results fetched per query.
    pub max_search_results: usize,
    /// Maximum writer revision passes before the gate forces termination.
    pub max_revisions: u32,
    /// Quality score the editor must reach to finish early, in [0, 1].
    pub quality_threshold: f64,
    /// Per-query search timeout in seconds.
    pub search_timeout_secs: u64,
    /// Per-call model timeout in seconds.
    pub llm_timeout_secs: u64,
    /// Custom SearXNG instance URL (overrides auto-discovery).
    pub searxng_url: Option<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            max_search_results: 10,
            max_revisions: 2,
            quality_threshold: 0.8,
            search_timeout_secs: 30,
            llm_timeout_secs: 60,
            searxng_url: None,
        }
    }
}

impl WorkflowConfig {
    /// Load configuration from environment variables, starting from the
    /// defaults. `.env` loading belongs to the binary (dotenvy), not here.
    pub fn from_env() -> Result<Self> {
        let mut config = WorkflowConfig::default();
        config.model = ModelConfig::from_env()?;

        if let Ok(val) = env::var("MAX_SEARCH_RESULTS") {
            config.max_search_results = val
                .parse()
                .context("MAX_SEARCH_RESULTS must be a positive integer")?;
        }
        if let Ok(val) = env::var("MAX_REVISIONS") {
            config.max_revisions = val
                .parse()
                .context("MAX_REVISIONS must be a non-negative integer")?;
        }
        if let Ok(val) = env::var("QUALITY_THRESHOLD") {
            config.quality_threshold = val
                .parse()
                .context("QUALITY_THRESHOLD must be a number in [0, 1]")?;
        }
        if let Ok(val) = env::var("SEARCH_TIMEOUT") {
            config.search_timeout_secs = val
                .parse()
                .context("SEARCH_TIMEOUT must be a number of seconds")?;
        }
        if let Ok(val) = env::var("LLM_TIMEOUT") {
            config.llm_timeout_secs = val
                .parse()
                .context("LLM_TIMEOUT must be a number of seconds")?;
        }
        if let Ok(val) = env::var("SEARXNG_URL") {
            config.searxng_url = Some(val);
        }

        Ok(config)
    }

    /// Fail fast with a clear message rather than mid-run with a confusing
    /// one. Called once before the first run begins.
    pub fn validate(&self) -> Result<(), crate::error::WorkflowError> {
        self.model.validate()?;

        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(crate::error::WorkflowError::Configuration(format!(
                "QUALITY_THRESHOLD must be in [0, 1], got {}",
                self.quality_threshold
            )));
        }
        if self.max_search_results == 0 {
            return Err(crate::error::WorkflowError::Configuration(
                "MAX_SEARCH_RESULTS must be at least 1".to_string(),
            ));
        }
        if self.search_timeout_secs == 0 || self.llm_timeout_secs == 0 {
            return Err(crate::error::WorkflowError::Configuration(
                "timeouts must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }
}
