//! Draftsmith Server
//!
//! Axum server that embeds and serves the web frontend with API routes.
//! Fully wired to the real Coordinator from crates/core.

use axum::{
    body::Body,
    extract::State,
    http::{header, Response, StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use draftsmith_core::config::WorkflowConfig;
use draftsmith_core::models::LlmProvider;
use draftsmith_core::workflow::{Coordinator, RunEvent, RunReport};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc, RwLock},
};
use utoipa::{OpenApi, ToSchema};

/// Embedded frontend assets
#[derive(RustEmbed)]
#[folder = "assets"]
struct Assets;

/// Application state
struct AppState {
    run_status: RwLock<RunStatus>,
    event_tx: broadcast::Sender<RunEvent>,
    /// Report of the most recent finished run
    last_report: RwLock<Option<RunReport>>,
}

#[derive(Default, Clone, Serialize, ToSchema)]
struct RunStatus {
    /// "idle", "running", "complete", "failed" or "error"
    status: String,
    topic: Option<String>,
    active_step: Option<String>,
    quality_score: Option<f64>,
    revision_count: u32,
}

type SharedState = Arc<AppState>;

// === API Types ===

#[derive(Deserialize, ToSchema)]
struct StartRunRequest {
    topic: String,
    settings: Option<RunSettings>,
}

/// Per-run overrides; anything unset falls back to the persisted config
/// and the environment.
#[derive(Deserialize, ToSchema)]
struct RunSettings {
    provider: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    max_search_results: Option<usize>,
    max_revisions: Option<u32>,
    quality_threshold: Option<f64>,
    searxng_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct ApiResponse {
    success: bool,
    message: String,
}

// === Config API Types ===

/// Persisted configuration (subset of WorkflowConfig exposed to the frontend)
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
struct PersistedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_search_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_revisions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    searxng_url: Option<String>,
}

impl PersistedConfig {
    async fn load() -> Self {
        let path = PathBuf::from(".draftsmith/config.json");
        if path.exists() {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => Self::default(),
            }
        } else {
            Self::default()
        }
    }

    async fn save(&self) -> Result<(), std::io::Error> {
        let path = PathBuf::from(".draftsmith/config.json");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(&path, content).await
    }

    fn merge(&mut self, other: PersistedConfig) {
        if other.provider.is_some() {
            self.provider = other.provider;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.max_search_results.is_some() {
            self.max_search_results = other.max_search_results;
        }
        if other.max_revisions.is_some() {
            self.max_revisions = other.max_revisions;
        }
        if other.quality_threshold.is_some() {
            self.quality_threshold = other.quality_threshold;
        }
        if other.searxng_url.is_some() {
            self.searxng_url = other.searxng_url;
        }
    }

    /// Layer the persisted values over an env-derived config.
    fn apply(&self, config: &mut WorkflowConfig) {
        if let Some(ref p) = self.provider {
            if let Some(provider) = LlmProvider::parse(p) {
                config.model.model = provider.default_model().to_string();
                if let Some(var) = provider.api_key_var() {
                    if let Ok(key) = std::env::var(var) {
                        config.model.api_key = key;
                    }
                }
                config.model.provider = provider;
            }
        }
        if let Some(ref m) = self.model {
            config.model.model = m.clone();
        }
        if let Some(ref url) = self.base_url {
            config.model.base_url = Some(url.clone());
        }
        if let Some(n) = self.max_search_results {
            config.max_search_results = n;
        }
        if let Some(n) = self.max_revisions {
            config.max_revisions = n;
        }
        if let Some(t) = self.quality_threshold {
            config.quality_threshold = t;
        }
        if let Some(ref url) = self.searxng_url {
            config.searxng_url = Some(url.clone());
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
struct ConfigResponse {
    config: PersistedConfig,
    defaults: ConfigDefaults,
}

#[derive(Debug, Serialize, ToSchema)]
struct ConfigDefaults {
    provider: &'static str,
    max_search_results: usize,
    max_revisions: u32,
    quality_threshold: f64,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        let defaults = WorkflowConfig::default();
        Self {
            provider: "anthropic",
            max_search_results: defaults.max_search_results,
            max_revisions: defaults.max_revisions,
            quality_threshold: defaults.quality_threshold,
        }
    }
}

// === Provider API Types ===

#[derive(Debug, Serialize, ToSchema)]
struct ProviderInfo {
    id: String,
    name: String,
    default_model: String,
    supports_base_url: bool,
    env_var: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
struct ProvidersResponse {
    providers: Vec<ProviderInfo>,
}

fn get_provider_info() -> Vec<ProviderInfo> {
    LlmProvider::all()
        .into_iter()
        .map(|p| ProviderInfo {
            id: serde_json::to_value(&p)
                .ok()
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default(),
            name: p.display_name().to_string(),
            default_model: p.default_model().to_string(),
            supports_base_url: p.supports_base_url(),
            env_var: p.api_key_var().map(String::from),
        })
        .collect()
}

#[derive(Parser, Clone)]
#[command(author, version, about = "Draftsmith - Multi-Agent Research Assistant")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the Draftsmith server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// Research a topic from the command line (no server)
    Run {
        /// The topic to research
        topic: String,
        /// Write the final report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// === OpenAPI Definition ===

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Draftsmith API",
        version = "1.0.0",
        description = "API for the Draftsmith multi-agent research assistant"
    ),
    paths(
        get_status,
        start_run,
        get_report,
        get_config,
        update_config,
        get_providers
    ),
    components(schemas(
        RunStatus,
        ApiResponse,
        StartRunRequest,
        RunSettings,
        ConfigResponse,
        ConfigDefaults,
        PersistedConfig,
        ProvidersResponse,
        ProviderInfo
    )),
    tags(
        (name = "run", description = "Research run management"),
        (name = "config", description = "Configuration management"),
        (name = "providers", description = "LLM provider discovery")
    )
)]
struct ApiDoc;

// === API Handlers ===

/// Get run status
#[utoipa::path(
    get,
    path = "/api/v1/run/status",
    tag = "run",
    responses(
        (status = 200, description = "Current run status", body = RunStatus)
    )
)]
async fn get_status(State(state): State<SharedState>) -> Json<RunStatus> {
    let status = state.run_status.read().await;
    Json(status.clone())
}

/// Start a research run on a topic
#[utoipa::path(
    post,
    path = "/api/v1/run/start",
    tag = "run",
    request_body = StartRunRequest,
    responses(
        (status = 200, description = "Run accepted or rejected", body = ApiResponse)
    )
)]
async fn start_run(
    State(state): State<SharedState>,
    Json(req): Json<StartRunRequest>,
) -> Json<ApiResponse> {
    // One run at a time.
    {
        let mut status = state.run_status.write().await;
        if status.status == "running" {
            return Json(ApiResponse {
                success: false,
                message: "A run is already in progress".to_string(),
            });
        }
        *status = RunStatus {
            status: "running".to_string(),
            topic: Some(req.topic.clone()),
            active_step: Some("researcher".to_string()),
            quality_score: None,
            revision_count: 0,
        };
    }

    tracing::info!(topic = %req.topic, "starting run");

    // Env config, then persisted overrides, then per-run overrides.
    let mut config = match WorkflowConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            state.run_status.write().await.status = "error".to_string();
            return Json(ApiResponse {
                success: false,
                message: format!("configuration error: {:#}", e),
            });
        }
    };
    PersistedConfig::load().await.apply(&mut config);
    if let Some(settings) = &req.settings {
        let overrides = PersistedConfig {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            max_search_results: settings.max_search_results,
            max_revisions: settings.max_revisions,
            quality_threshold: settings.quality_threshold,
            searxng_url: settings.searxng_url.clone(),
        };
        overrides.apply(&mut config);
    }

    let coordinator = match Coordinator::new(config) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            state.run_status.write().await.status = "error".to_string();
            return Json(ApiResponse {
                success: false,
                message: format!("{:#}", e),
            });
        }
    };

    let (event_mpsc_tx, mut event_mpsc_rx) = mpsc::channel::<RunEvent>(100);
    let coordinator = coordinator.with_event_channel(event_mpsc_tx);

    // Bridge events to broadcast and keep the status snapshot current.
    let broadcast_tx = state.event_tx.clone();
    let state_bridge = state.clone();
    tokio::spawn(async move {
        use draftsmith_core::workflow::RunEventKind;
        while let Some(event) = event_mpsc_rx.recv().await {
            if event.kind == RunEventKind::StepStarted {
                state_bridge.run_status.write().await.active_step = Some(event.step.clone());
            }
            let _ = broadcast_tx.send(event);
        }
    });

    // Run the coordinator
    let state_run = state.clone();
    let topic = req.topic.clone();
    tokio::spawn(async move {
        let report = coordinator.run(&topic).await;
        tracing::info!(success = report.success, "run finished");

        let mut status = state_run.run_status.write().await;
        status.status = if report.success { "complete" } else { "failed" }.to_string();
        status.active_step = None;
        status.quality_score = report.state.quality_score;
        status.revision_count = report.state.revision_count;
        drop(status);

        *state_run.last_report.write().await = Some(report);
    });

    Json(ApiResponse {
        success: true,
        message: format!("Run started for topic: {}", req.topic),
    })
}

/// Download the final report of the last finished run
#[utoipa::path(
    get,
    path = "/api/v1/run/report",
    tag = "run",
    responses(
        (status = 200, description = "The final report as Markdown"),
        (status = 404, description = "No finished run with a report")
    )
)]
async fn get_report(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.last_report.read().await;
    let report = guard
        .as_ref()
        .and_then(|r| r.state.final_report.as_deref());

    match report {
        Some(text) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"report.md\"",
            )
            .body(Body::from(text.to_string()))
            .unwrap(),
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("No report available yet"))
            .unwrap(),
    }
}

/// SSE endpoint for real-time events with heartbeat
async fn events(
    State(state): State<SharedState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    use futures::stream;

    let rx = state.event_tx.subscribe();

    // Timeout-based stream with a heartbeat comment every 15 seconds
    let stream = stream::unfold(rx, |mut rx| async move {
        let timeout = tokio::time::timeout(std::time::Duration::from_secs(15), rx.recv()).await;

        match timeout {
            Ok(Ok(event)) => {
                let json = serde_json::to_string(&event).unwrap_or_default();
                Some((Ok(Event::default().data(json)), rx))
            }
            Ok(Err(_)) => None, // Channel closed
            Err(_) => Some((Ok(Event::default().comment("heartbeat")), rx)),
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// === Config Handlers ===

/// Get current configuration
#[utoipa::path(
    get,
    path = "/api/v1/config",
    tag = "config",
    responses(
        (status = 200, description = "Current configuration and defaults", body = ConfigResponse)
    )
)]
async fn get_config() -> Json<ConfigResponse> {
    let config = PersistedConfig::load().await;
    Json(ConfigResponse {
        config,
        defaults: ConfigDefaults::default(),
    })
}

/// Update configuration (partial merge)
#[utoipa::path(
    patch,
    path = "/api/v1/config",
    tag = "config",
    request_body = PersistedConfig,
    responses(
        (status = 200, description = "Updated configuration", body = ConfigResponse)
    )
)]
async fn update_config(Json(updates): Json<PersistedConfig>) -> Json<ConfigResponse> {
    let mut config = PersistedConfig::load().await;
    config.merge(updates);

    if let Err(e) = config.save().await {
        tracing::error!(error = %e, "failed to save config");
    }

    Json(ConfigResponse {
        config,
        defaults: ConfigDefaults::default(),
    })
}

/// Get available LLM providers
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    tag = "providers",
    responses(
        (status = 200, description = "List of supported LLM providers", body = ProvidersResponse)
    )
)]
async fn get_providers() -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: get_provider_info(),
    })
}

async fn serve_openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// === Static File Serving ===

async fn serve_static(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');

    if let Some(file) = Assets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime.as_ref())
            .body(Body::from(file.data.to_vec()))
            .unwrap();
    }

    // SPA fallback
    if let Some(file) = Assets::get("index.html") {
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html")
            .body(Body::from(file.data.to_vec()))
            .unwrap();
    }

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Body::from("Not Found"))
        .unwrap()
}

// === Server Entry ===

pub async fn run_server(port: u16) -> anyhow::Result<()> {
    let (event_tx, _) = broadcast::channel::<RunEvent>(100);

    let state: SharedState = Arc::new(AppState {
        run_status: RwLock::new(RunStatus {
            status: "idle".to_string(),
            ..RunStatus::default()
        }),
        event_tx,
        last_report: RwLock::new(None),
    });

    let run_routes = Router::new()
        .route("/status", get(get_status))
        .route("/start", post(start_run))
        .route("/events", get(events))
        .route("/report", get(get_report));

    let app = Router::new()
        .nest("/api/v1/run", run_routes)
        .route("/api/v1/config", get(get_config).patch(update_config))
        .route("/api/v1/providers", get(get_providers))
        .route("/api/v1/openapi.json", get(serve_openapi))
        .fallback(get(serve_static))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("🚀 Draftsmith Server running at http://{}", addr);
    println!("   API v1 Routes:");
    println!("   Run:       /api/v1/run/status, /start, /events, /report");
    println!("   Config:    /api/v1/config (GET, PATCH)");
    println!("   Providers: /api/v1/providers (GET)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run a topic from the command line, printing or saving the report.
async fn run_cli(topic: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = WorkflowConfig::from_env()?;
    PersistedConfig::load().await.apply(&mut config);

    let coordinator = Coordinator::new(config)?;
    println!("🔎 Researching: {}", topic);

    let report = coordinator.run(topic).await;
    if !report.success {
        anyhow::bail!("run failed; see logs for details");
    }

    let text = report
        .state
        .final_report
        .unwrap_or_default();
    match output {
        Some(path) => {
            tokio::fs::write(&path, &text).await?;
            println!("✅ Report written to {}", path.display());
        }
        None => println!("{}", text),
    }
    if let Some(score) = report.state.quality_score {
        println!(
            "   Quality: {:.2} after {} revision(s)",
            score, report.state.revision_count
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Some(CliCommand::Run { topic, output }) => run_cli(&topic, output).await,
        Some(CliCommand::Serve { port }) => run_server(port).await,
        None => run_server(8080).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_config_merge_keeps_unset_fields() {
        let mut base = PersistedConfig {
            provider: Some("anthropic".to_string()),
            max_revisions: Some(3),
            ..PersistedConfig::default()
        };
        base.merge(PersistedConfig {
            model: Some("gpt-4o".to_string()),
            ..PersistedConfig::default()
        });

        assert_eq!(base.provider.as_deref(), Some("anthropic"));
        assert_eq!(base.model.as_deref(), Some("gpt-4o"));
        assert_eq!(base.max_revisions, Some(3));
    }

    #[test]
    fn test_persisted_config_applies_over_defaults() {
        let persisted = PersistedConfig {
            max_revisions: Some(5),
            quality_threshold: Some(0.9),
            searxng_url: Some("https://searx.internal".to_string()),
            ..PersistedConfig::default()
        };

        let mut config = WorkflowConfig::default();
        persisted.apply(&mut config);

        assert_eq!(config.max_revisions, 5);
        assert!((config.quality_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(
            config.searxng_url.as_deref(),
            Some("https://searx.internal")
        );
        // Untouched fields keep their defaults.
        assert_eq!(config.max_search_results, 10);
    }

    #[test]
    fn test_provider_catalogue_is_complete() {
        let providers = get_provider_info();
        assert_eq!(providers.len(), LlmProvider::all().len());
        assert!(providers.iter().any(|p| p.id == "anthropic"));
        let ollama = providers.iter().find(|p| p.id == "ollama").unwrap();
        assert!(ollama.env_var.is_none());
    }
}
