// Provider detection and configuration assembly

use super::{Provider, ProviderConfig};
use crate::error::{Error, Result};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Classify an endpoint or provider-name string. This is a substring
/// heuristic, not a strict parse: anything not recognizably Azure is
/// treated as OpenAI-compatible, including arbitrary custom endpoint URLs.
pub fn classify(endpoint: &str) -> Provider {
    if endpoint.to_lowercase().contains("azure.com") {
        Provider::Azure
    } else {
        Provider::OpenAi
    }
}

/// Build a provider configuration from an endpoint, a plaintext API key and
/// an optional deployment/model name. Azure endpoints require a deployment
/// name; OpenAI-compatible endpoints default the model instead of failing.
pub fn resolve(
    endpoint: &str,
    api_key: &str,
    deployment_or_model: Option<&str>,
) -> Result<ProviderConfig> {
    match classify(endpoint) {
        Provider::Azure => {
            let deployment = deployment_or_model.ok_or_else(|| {
                Error::Config("deploymentName is required for Azure OpenAI endpoints".into())
            })?;
            Ok(ProviderConfig {
                provider: Provider::Azure,
                api_key: api_key.to_string(),
                endpoint: Some(endpoint.to_string()),
                deployment_name: Some(deployment.to_string()),
                model: None,
            })
        }
        Provider::OpenAi => Ok(ProviderConfig {
            provider: Provider::OpenAi,
            api_key: api_key.to_string(),
            endpoint: Some(endpoint.to_string()),
            deployment_name: None,
            model: Some(
                deployment_or_model
                    .unwrap_or(DEFAULT_OPENAI_MODEL)
                    .to_string(),
            ),
        }),
    }
}

/// Map a stored credential's provider name to a callable endpoint. Azure
/// credentials carry their full endpoint URL as the provider name, a name
/// containing "openai" means the public OpenAI API, and anything else is
/// taken as a custom OpenAI-compatible base URL.
pub fn endpoint_for_provider(provider_name: &str) -> String {
    let lower = provider_name.to_lowercase();

    if lower.contains("azure") {
        return lower;
    }

    if lower.contains("openai") {
        return OPENAI_API_BASE.to_string();
    }

    lower
}
