use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use ragchat_core::{
    ChatError, ChatPipeline, ChatRequest, ChatResponse, ErrorBody, PipelineConfig,
    ProviderRegistry, ResolvedRoles,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
}

impl AppState {
    pub fn new(pipeline: ChatPipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}

/// [`ChatError`] rendered as a JSON error response.
pub struct ApiError(pub ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ChatError::Validation => StatusCode::BAD_REQUEST,
            ChatError::Stage { .. } | ChatError::Persist { .. } | ChatError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Resolve the roles against `registry`, then serve until the listener
/// fails.
pub async fn run_server(config: ServerConfig, registry: ProviderRegistry) -> anyhow::Result<()> {
    let roles = ResolvedRoles::resolve(&registry, &config.resolver);
    let pipeline_config = PipelineConfig::builder()
        .results_path(config.results_path.clone())
        .retriever_failure(config.retriever_failure)
        .build()?;
    let app = app_router(AppState::new(ChatPipeline::new(roles, pipeline_config)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for ragchat server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(results_path = %config.results_path.display(), "ragchat listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "ragchat", "roles": state.pipeline.sources()}))
}

/// `POST /chat`. Bodies that are missing or not a JSON object are treated
/// as a request without a message.
async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatResponse>, ApiError> {
    let request = ChatRequest::from_slice(&body);
    if request.message.is_none() && !body.is_empty() {
        debug!(body_len = body.len(), "chat request body carries no string message");
    }

    let response = state.pipeline.chat(&request).await?;
    Ok(Json(response))
}
