//! # Model Configuration
//!
//! Centralized LLM provider configuration and the `LanguageModel`
//! collaborator seam. The production implementation (`RigModel`) builds a
//! rig agent per call so each step can supply its own system prompt, and
//! enforces the configured per-call timeout.

use async_trait::async_trait;
use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::WorkflowError;

/// Supported LLM providers.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    OpenRouter,
    Ollama,
}

impl LlmProvider {
    /// All available providers, for UI catalogues.
    pub fn all() -> Vec<LlmProvider> {
        vec![
            LlmProvider::Anthropic,
            LlmProvider::OpenAI,
            LlmProvider::OpenRouter,
            LlmProvider::Ollama,
        ]
    }

    /// Display name for UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::OpenRouter => "OpenRouter",
            LlmProvider::Ollama => "Ollama",
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::OpenRouter => Some("OPENROUTER_API_KEY"),
            LlmProvider::Ollama => None,
        }
    }

    /// Default model when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "claude-sonnet-4-20250514",
            LlmProvider::OpenAI => "gpt-4o",
            LlmProvider::OpenRouter => "anthropic/claude-3.5-sonnet",
            LlmProvider::Ollama => "llama3.2",
        }
    }

    /// Whether this provider accepts a custom base URL.
    pub fn supports_base_url(&self) -> bool {
        matches!(self, LlmProvider::OpenAI)
    }

    /// Parse a provider id as used in the API and env vars.
    pub fn parse(s: &str) -> Option<LlmProvider> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Some(LlmProvider::Anthropic),
            "openai" => Some(LlmProvider::OpenAI),
            "openrouter" => Some(LlmProvider::OpenRouter),
            "ollama" => Some(LlmProvider::Ollama),
            _ => None,
        }
    }
}

/// LLM model selection and sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// LLM provider to use.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name (e.g., "claude-sonnet-4-20250514", "gpt-4o").
    pub model: String,
    /// Optional base URL override for OpenAI-compatible APIs.
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key for the provider. Never serialized.
    #[serde(skip)]
    pub api_key: String,
    /// Sampling temperature in [0, 2].
    pub temperature: f64,
    /// Maximum output tokens per completion.
    pub max_tokens: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            model: LlmProvider::Anthropic.default_model().to_string(),
            base_url: None,
            api_key: String::new(),
            temperature: 0.7,
            max_tokens: 4000,
        }
    }
}

impl ModelConfig {
    /// Config for a specific provider with its default model.
    pub fn with_provider(provider: LlmProvider) -> Self {
        let model = provider.default_model().to_string();
        Self {
            provider,
            model,
            ..Self::default()
        }
    }

    /// Load model settings from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        use anyhow::Context;

        let mut config = ModelConfig::default();

        if let Ok(val) = env::var("DRAFTSMITH_PROVIDER") {
            config.provider = LlmProvider::parse(&val).ok_or_else(|| {
                anyhow::anyhow!("unknown provider '{}' in DRAFTSMITH_PROVIDER", val)
            })?;
            config.model = config.provider.default_model().to_string();
        }
        if let Ok(val) = env::var("DRAFTSMITH_MODEL") {
            config.model = val;
        }
        if let Ok(val) = env::var("DRAFTSMITH_BASE_URL") {
            config.base_url = Some(val);
        }
        if let Ok(val) = env::var("DRAFTSMITH_TEMPERATURE") {
            config.temperature = val
                .parse()
                .context("DRAFTSMITH_TEMPERATURE must be a number (e.g., 0.7)")?;
        }
        if let Ok(val) = env::var("DRAFTSMITH_MAX_TOKENS") {
            config.max_tokens = val
                .parse()
                .context("DRAFTSMITH_MAX_TOKENS must be a positive integer")?;
        }
        if let Some(var) = config.provider.api_key_var() {
            if let Ok(key) = env::var(var) {
                config.api_key = key;
            }
        }

        Ok(config)
    }

    /// Validate model settings before any run begins.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.model.is_empty() {
            return Err(WorkflowError::Configuration(
                "model name cannot be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(WorkflowError::Configuration(format!(
                "temperature must be in [0, 2], got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(WorkflowError::Configuration(
                "max_tokens must be at least 1".to_string(),
            ));
        }
        if let Some(var) = self.provider.api_key_var() {
            if self.api_key.is_empty() {
                return Err(WorkflowError::Configuration(format!(
                    "{} is required for provider {}",
                    var,
                    self.provider.display_name()
                )));
            }
        }
        Ok(())
    }
}

/// The language-model collaborator contract: prompt in, text out.
///
/// Workflow steps only ever see this trait. Tests substitute scripted
/// implementations; production uses [`RigModel`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String, WorkflowError>;
}

enum ProviderClient {
    Anthropic(rig::providers::anthropic::Client),
    OpenAI(rig::providers::openai::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Ollama(rig::providers::ollama::Client),
}

enum ProviderAgent {
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    OpenRouter(Agent<rig::providers::openrouter::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    async fn prompt(&self, prompt: &str) -> Result<String, rig::completion::PromptError> {
        match self {
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await,
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await,
            ProviderAgent::OpenRouter(agent) => agent.prompt(prompt).await,
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await,
        }
    }
}

/// Production `LanguageModel` backed by rig provider clients.
pub struct RigModel {
    client: ProviderClient,
    config: ModelConfig,
    timeout: Duration,
}

impl RigModel {
    /// Build a client for the configured provider.
    pub fn new(config: &ModelConfig, timeout_secs: u64) -> Result<Self, WorkflowError> {
        let client = match config.provider {
            LlmProvider::Anthropic => {
                let client = rig::providers::anthropic::ClientBuilder::new(&config.api_key)
                    .build()
                    .map_err(|e| WorkflowError::Configuration(e.to_string()))?;
                ProviderClient::Anthropic(client)
            }
            LlmProvider::OpenAI => {
                let builder = rig::providers::openai::Client::builder(&config.api_key);
                let client = if let Some(base_url) = &config.base_url {
                    builder.base_url(base_url).build()
                } else {
                    builder.build()
                };
                ProviderClient::OpenAI(client)
            }
            LlmProvider::OpenRouter => {
                let client = rig::providers::openrouter::Client::builder(&config.api_key).build();
                ProviderClient::OpenRouter(client)
            }
            LlmProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                ProviderClient::Ollama(client)
            }
        };

        Ok(Self {
            client,
            config: config.clone(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    // Agents carry the system prompt as their preamble, so each call
    // builds a fresh agent over the shared client.
    fn agent_for(&self, system_prompt: &str) -> ProviderAgent {
        let model = self.config.model.as_str();
        match &self.client {
            ProviderClient::Anthropic(client) => ProviderAgent::Anthropic(
                client
                    .agent(model)
                    .preamble(system_prompt)
                    .max_tokens(self.config.max_tokens)
                    .temperature(self.config.temperature)
                    .build(),
            ),
            ProviderClient::OpenAI(client) => ProviderAgent::OpenAI(
                client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder()
                    .preamble(system_prompt)
                    .max_tokens(self.config.max_tokens)
                    .temperature(self.config.temperature)
                    .build(),
            ),
            ProviderClient::OpenRouter(client) => ProviderAgent::OpenRouter(
                client
                    .agent(model)
                    .preamble(system_prompt)
                    .max_tokens(self.config.max_tokens)
                    .temperature(self.config.temperature)
                    .build(),
            ),
            ProviderClient::Ollama(client) => ProviderAgent::Ollama(
                client
                    .agent(model)
                    .preamble(system_prompt)
                    .max_tokens(self.config.max_tokens)
                    .temperature(self.config.temperature)
                    .build(),
            ),
        }
    }
}

#[async_trait]
impl LanguageModel for RigModel {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String, WorkflowError> {
        let agent = self.agent_for(system_prompt);

        tracing::debug!(
            model = %self.config.model,
            temperature = self.config.temperature,
            "calling language model"
        );

        match tokio::time::timeout(self.timeout, agent.prompt(prompt)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(WorkflowError::Collaborator {
                collaborator: "language model",
                reason: e.to_string(),
            }),
            Err(_) => Err(WorkflowError::CollaboratorTimeout {
                collaborator: "language model",
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}
