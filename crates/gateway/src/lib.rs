//! HTTP API gateway for ragchat.
//!
//! Exposes:
//! - `POST /chat/{session_id}`: direct or retrieval-augmented chat
//! - `GET /sessions/{session_id}`: a session's stored History
//! - `GET /health`: liveness
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use ragchat_agent::{ChatService, ContextRetriever, ConversationPipeline, PipelineSettings};
use ragchat_config::AppConfig;
use ragchat_core::retrieval::{Category, VectorIndex};
use ragchat_memory::Ingestor;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub chat: ChatService,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(config: AppConfig, chat: ChatService) -> SharedState {
        Arc::new(Self { config, chat })
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS restricted to `gateway.allowed_origins`
/// - Request body size limit (`gateway.body_limit_bytes`)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.allowed_origins);
    let body_limit = state.config.gateway.body_limit_bytes;

    Router::new()
        .route("/health", get(api::health_handler))
        .route("/chat/{session_id}", post(api::chat_handler))
        .route("/sessions/{session_id}", get(api::session_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

/// Wire every collaborator from configuration.
pub async fn build_state(config: AppConfig) -> Result<SharedState, Box<dyn std::error::Error>> {
    let providers = ragchat_providers::build_from_config(&config);
    let model = providers
        .default()
        .ok_or("No default provider configured; set an API key")?;
    let embedder = providers
        .embedding()
        .ok_or("No embedding provider configured")?;

    let index = ragchat_memory::vector_index_from_config(&config)?;
    let sessions = ragchat_memory::session_store_from_config(&config);

    if index.name() == "in_memory" {
        seed_index(&config, embedder.clone(), index.clone()).await;
    }

    let pipeline = ConversationPipeline::new(model, PipelineSettings::from_config(&config));
    let retriever = ContextRetriever::from_config(embedder, index, &config);
    let mut chat = ChatService::new(sessions, pipeline, retriever).configured(&config);

    if let Some(url) = &config.database.url {
        let executor = ragchat_memory::PostgresExecutor::connect(url, config.database.max_connections)
            .await?
            .with_timeout(Duration::from_secs(config.timeouts.query_secs));
        chat = chat.with_executor(Arc::new(executor));
    } else {
        warn!("No database configured; retrieval mode requests will fail");
    }

    Ok(GatewayState::new(config, chat))
}

/// Load the configured instruction and domain files into an in-memory index.
async fn seed_index(
    config: &AppConfig,
    embedder: Arc<dyn ragchat_core::Provider>,
    index: Arc<dyn VectorIndex>,
) {
    let ingestor = Ingestor::new(
        embedder,
        index,
        &config.embedding.model,
        config.embedding.dimension,
    );

    let files = [
        (config.retrieval.instruction_file.as_deref(), Category::Instruction),
        (config.retrieval.domain_file.as_deref(), Category::DomainKnowledge),
    ];
    for (file, category) in files {
        let Some(file) = file else { continue };
        match ingestor.ingest_file(Path::new(file), category).await {
            Ok(report) => info!(
                file,
                category = %category,
                indexed = report.indexed,
                skipped = report.skipped,
                "Seeded in-memory index"
            ),
            Err(e) => warn!(file, error = %e, "Could not seed in-memory index"),
        }
    }
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = build_state(config).await?;
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_memory::InMemoryVectorIndex;

    #[test]
    fn invalid_origins_are_skipped() {
        // Building the layer must not panic on a bad origin
        let _ = cors_layer(&["http://localhost:3000".to_string(), "not a\nheader".to_string()]);
    }

    #[tokio::test]
    async fn default_config_builds_state_without_database() {
        let state = build_state(AppConfig::default()).await.unwrap();
        assert!(state.chat.executor().is_none());
        assert_eq!(state.chat.sessions().name(), "memory");
        assert_eq!(state.chat.retriever().index().name(), "in_memory");
    }

    #[tokio::test]
    async fn seeding_with_missing_files_leaves_index_empty() {
        let mut config = AppConfig::default();
        config.retrieval.instruction_file = Some("/nonexistent/Instruction.txt".into());
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new());
        let embedder = ragchat_providers::build_from_config(&config).embedding().unwrap();

        seed_index(&config, embedder, index.clone()).await;
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
