// LLM Engine API - process bootstrap

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use llm_engine::api::{self, AppState};
use llm_engine::config::{self, AppConfig};
use llm_engine::crypto::ApiKeyCodec;
use llm_engine::db::CredentialStore;
use llm_engine::proxy::translator::ChatClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env()?;
    let codec = ApiKeyCodec::new(&config.encryption_key);

    if let Some(dir) = config.database_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let store = CredentialStore::open(&config.database_path)?;
    tracing::info!("credential store opened at {:?}", config.database_path);

    let state = AppState {
        store: Arc::new(store),
        codec,
        chat: ChatClient::new(),
        provider_defaults: config.provider_defaults.clone(),
    };

    config::init_config(config);
    api::start_server(state).await
}
