// Upstream chat-completion calls and response normalization

use serde::Deserialize;
use serde_json::{json, Value};

use super::resolver::{DEFAULT_OPENAI_MODEL, OPENAI_API_BASE};
use super::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, CompletionChoice, Provider,
    ProviderConfig, Role, TokenUsage,
};
use crate::error::{Error, Result};

const AZURE_API_VERSION: &str = "2024-08-01-preview";

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TOP_P: f64 = 1.0;

/// Client for the upstream chat-completion APIs. Both dialects speak the
/// same request body; they differ in URL shape and auth header.
#[derive(Debug, Clone, Default)]
pub struct ChatClient {
    http_client: reqwest::Client,
}

impl ChatClient {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    /// Forward a normalized request to the configured provider and map the
    /// response back into the normalized envelope. Every upstream failure
    /// surfaces uniformly as `Error::Upstream`.
    pub async fn complete(
        &self,
        config: &ProviderConfig,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let params = build_completion_params(config, request);
        let url = completion_url(config);

        let req = self
            .http_client
            .post(&url)
            .header("content-type", "application/json")
            .json(&params);
        let req = match config.provider {
            Provider::Azure => req.header("api-key", &config.api_key),
            Provider::OpenAi => {
                req.header("Authorization", format!("Bearer {}", config.api_key))
            }
        };

        let response = req
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(upstream_error_message(
                status.as_u16(),
                &body,
            )));
        }

        let upstream: UpstreamCompletion = response
            .json()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;
        Ok(normalize_response(upstream))
    }
}

/// Build the upstream call parameters. Messages pass through unchanged;
/// Azure uses the deployment name as the model identifier.
pub fn build_completion_params(config: &ProviderConfig, request: &ChatCompletionRequest) -> Value {
    let model = match config.provider {
        Provider::Azure => config.deployment_name.clone().unwrap_or_default(),
        Provider::OpenAi => config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
    };

    json!({
        "model": model,
        "messages": request.messages,
        "temperature": request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "top_p": request.top_p.unwrap_or(DEFAULT_TOP_P),
        "frequency_penalty": request.frequency_penalty.unwrap_or(0.0),
        "presence_penalty": request.presence_penalty.unwrap_or(0.0),
    })
}

fn completion_url(config: &ProviderConfig) -> String {
    match config.provider {
        Provider::Azure => format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config
                .endpoint
                .as_deref()
                .unwrap_or_default()
                .trim_end_matches('/'),
            config.deployment_name.as_deref().unwrap_or_default(),
            AZURE_API_VERSION,
        ),
        Provider::OpenAi => format!(
            "{}/chat/completions",
            config
                .endpoint
                .as_deref()
                .unwrap_or(OPENAI_API_BASE)
                .trim_end_matches('/'),
        ),
    }
}

fn upstream_error_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string());
    format!("upstream request failed: {} {}", status, detail)
}

// Upstream wire shapes. Providers routinely omit fields, so everything the
// normalizer defaults is optional here.

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamCompletion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<UpstreamChoice>,
    pub usage: Option<UpstreamUsage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamChoice {
    #[serde(default)]
    pub index: u32,
    pub message: Option<UpstreamMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamMessage {
    pub role: Option<Role>,
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Map the heterogeneous upstream payload into the normalized envelope.
/// Absent finish reasons become "stop", absent content becomes the empty
/// string, absent usage counters become zero.
pub fn normalize_response(upstream: UpstreamCompletion) -> ChatCompletionResponse {
    let choices = upstream
        .choices
        .into_iter()
        .map(|choice| {
            let message = choice.message.unwrap_or_default();
            CompletionChoice {
                index: choice.index,
                message: ChatMessage {
                    role: message.role.unwrap_or(Role::Assistant),
                    content: message.content.unwrap_or_default(),
                },
                finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            }
        })
        .collect();

    let usage = upstream.usage.unwrap_or_default();

    ChatCompletionResponse {
        id: upstream.id,
        object: upstream.object,
        created: upstream.created,
        model: upstream.model,
        choices,
        usage: TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        },
    }
}
