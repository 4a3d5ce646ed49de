// HTTP API server

use std::sync::Arc;

use anyhow::Result;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod handlers;

use crate::config;
use crate::crypto::ApiKeyCodec;
use crate::db::CredentialStore;
use crate::proxy::translator::ChatClient;
use crate::proxy::ProviderConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CredentialStore>,
    pub codec: ApiKeyCodec,
    pub chat: ChatClient,
    pub provider_defaults: Option<ProviderConfig>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/chat/completions", post(handlers::chat_completions))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState) -> Result<()> {
    let config =
        config::get_config().ok_or_else(|| anyhow::anyhow!("config not initialized"))?;
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("LLM Engine API listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
