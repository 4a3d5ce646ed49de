// API request handlers

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::{Error, Result};
use crate::proxy::resolver;
use crate::proxy::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ProviderConfig};

/// Inbound request body. Credentials are optional: when absent the stored
/// default credential is used, then the environment-configured provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletionBody {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub deployment_name: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub frequency_penalty: Option<f64>,
    #[serde(default)]
    pub presence_penalty: Option<f64>,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "LLM Engine API",
        "endpoints": {
            "health": "GET /api/health",
            "chatCompletions": "POST /api/chat/completions"
        }
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "llm-engine"
    }))
}

pub async fn chat_completions(
    State(state): State<AppState>,
    Json(body): Json<ChatCompletionBody>,
) -> Result<Json<ChatCompletionResponse>> {
    if body.messages.is_empty() {
        return Err(Error::Config("messages array is required".into()));
    }

    let (config, request) = resolve_request(&state, body)?;
    let response = state.chat.complete(&config, &request).await?;
    Ok(Json(response))
}

/// Pick the provider configuration for a request. Explicit credentials win,
/// then the stored default credential, then the environment-configured
/// provider; with none of the three the request is rejected.
fn resolve_request(
    state: &AppState,
    body: ChatCompletionBody,
) -> Result<(ProviderConfig, ChatCompletionRequest)> {
    let mut request = ChatCompletionRequest {
        messages: body.messages,
        temperature: body.temperature,
        max_tokens: body.max_tokens,
        top_p: body.top_p,
        frequency_penalty: body.frequency_penalty,
        presence_penalty: body.presence_penalty,
    };

    if let Some(endpoint) = body.endpoint.as_deref() {
        let api_key = body
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("apiKey is required".into()))?;
        let config = resolver::resolve(
            endpoint,
            api_key,
            body.deployment_name.as_deref().or(body.model.as_deref()),
        )?;
        return Ok((config, request));
    }

    if let Some(stored) = state.store.get_default()? {
        let api_key = state.codec.decrypt(&stored.api_key_encrypted)?;
        let endpoint = resolver::endpoint_for_provider(&stored.provider_name);
        let config = resolver::resolve(&endpoint, &api_key, Some(stored.model_name.as_str()))?;

        // Stored sampling parameters act as request-level defaults.
        if request.temperature.is_none() {
            request.temperature = Some(stored.temperature);
        }
        if request.max_tokens.is_none() {
            request.max_tokens = Some(stored.max_tokens);
        }

        tracing::info!("using stored default credential {}", stored.name);
        return Ok((config, request));
    }

    if let Some(config) = state.provider_defaults.clone() {
        return Ok((config, request));
    }

    Err(Error::Config(
        "endpoint and apiKey are required when no default credential is configured".into(),
    ))
}
