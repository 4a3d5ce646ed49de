// Process-wide configuration, read from the environment once at startup

use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::proxy::resolver::DEFAULT_OPENAI_MODEL;
use crate::proxy::{Provider, ProviderConfig};

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Secret for the API key codec. Never logged.
    pub encryption_key: String,
    /// Provider assembled from environment variables, used when a request
    /// carries no credentials and no stored default exists.
    pub provider_defaults: Option<ProviderConfig>,
}

impl AppConfig {
    /// Read configuration from the environment. Fails when the encryption
    /// secret is absent or empty; the process must not start without it.
    pub fn from_env() -> anyhow::Result<Self> {
        let encryption_key = std::env::var("LLM_ENGINE_ENCRYPTION_KEY").unwrap_or_default();
        if encryption_key.trim().is_empty() {
            anyhow::bail!("LLM_ENGINE_ENCRYPTION_KEY must be set to a non-empty value");
        }

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let database_path = std::env::var("LLM_ENGINE_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_database_path());

        Ok(Self {
            host,
            port,
            database_path,
            encryption_key,
            provider_defaults: provider_defaults_from_env(),
        })
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("llm-engine")
        .join("credentials.db")
}

/// Environment-configured provider. A complete Azure variable set wins;
/// otherwise an OpenAI key is enough, with the model defaulted.
fn provider_defaults_from_env() -> Option<ProviderConfig> {
    let azure_endpoint = non_empty_var("AZURE_OPENAI_ENDPOINT");
    let azure_key = non_empty_var("AZURE_OPENAI_API_KEY");
    let azure_deployment = non_empty_var("AZURE_OPENAI_CHAT_DEPLOYMENT");

    if let (Some(endpoint), Some(api_key), Some(deployment)) =
        (azure_endpoint, azure_key, azure_deployment)
    {
        return Some(ProviderConfig {
            provider: Provider::Azure,
            api_key,
            endpoint: Some(endpoint),
            deployment_name: Some(deployment),
            model: None,
        });
    }

    let api_key = non_empty_var("OPENAI_API_KEY")?;
    Some(ProviderConfig {
        provider: Provider::OpenAi,
        api_key,
        endpoint: None,
        deployment_name: None,
        model: Some(
            non_empty_var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        ),
    })
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn init_config(config: AppConfig) {
    CONFIG.set(config).ok();
}

pub fn get_config() -> Option<AppConfig> {
    CONFIG.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "LLM_ENGINE_ENCRYPTION_KEY",
            "HOST",
            "PORT",
            "LLM_ENGINE_DB",
            "AZURE_OPENAI_ENDPOINT",
            "AZURE_OPENAI_API_KEY",
            "AZURE_OPENAI_CHAT_DEPLOYMENT",
            "OPENAI_API_KEY",
            "OPENAI_MODEL",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_encryption_key() {
        clear_env();
        assert!(AppConfig::from_env().is_err());

        std::env::set_var("LLM_ENGINE_ENCRYPTION_KEY", "   ");
        assert!(AppConfig::from_env().is_err());

        std::env::set_var("LLM_ENGINE_ENCRYPTION_KEY", "secret");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.provider_defaults.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_azure_defaults_win_when_complete() {
        clear_env();
        std::env::set_var("LLM_ENGINE_ENCRYPTION_KEY", "secret");
        std::env::set_var("AZURE_OPENAI_ENDPOINT", "https://myorg.openai.azure.com");
        std::env::set_var("AZURE_OPENAI_API_KEY", "azure-key");
        std::env::set_var("AZURE_OPENAI_CHAT_DEPLOYMENT", "gpt-4o-prod");
        std::env::set_var("OPENAI_API_KEY", "sk-ignored");

        let defaults = AppConfig::from_env().unwrap().provider_defaults.unwrap();
        assert_eq!(defaults.provider, Provider::Azure);
        assert_eq!(defaults.deployment_name.as_deref(), Some("gpt-4o-prod"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_openai_fallback_defaults_model() {
        clear_env();
        std::env::set_var("LLM_ENGINE_ENCRYPTION_KEY", "secret");
        std::env::set_var("OPENAI_API_KEY", "sk-test");

        let defaults = AppConfig::from_env().unwrap().provider_defaults.unwrap();
        assert_eq!(defaults.provider, Provider::OpenAi);
        assert_eq!(defaults.model.as_deref(), Some(DEFAULT_OPENAI_MODEL));
        clear_env();
    }
}
