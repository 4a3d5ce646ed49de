// Inserts an encrypted provider credential into the local store.

use llm_engine::config::AppConfig;
use llm_engine::crypto::ApiKeyCodec;
use llm_engine::db::{CredentialStore, NewCredential};

const USAGE: &str = "\
Usage: insert_credential <name> <provider> <model> <apiKey> [temperature] [maxTokens] [isDefault]

Examples:
  insert_credential \"Production GPT-4\" openai gpt-4 sk-... 0.7 2000 true
  insert_credential \"Azure GPT-35\" https://myorg.openai.azure.com gpt-35-turbo your-key 0.5 1500 false

Providers:
  - openai (OpenAI API)
  - full Azure endpoint URL (Azure OpenAI)
  - any custom OpenAI-compatible endpoint URL";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 4 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let credential = parse_credential(&args)?;

    let config = AppConfig::from_env()?;
    let codec = ApiKeyCodec::new(&config.encryption_key);
    if let Some(dir) = config.database_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let store = CredentialStore::open(&config.database_path)?;

    let stored = store.insert(&codec, credential)?;
    println!(
        "inserted credential {} ({}) default={}",
        stored.name, stored.id, stored.is_default
    );
    Ok(())
}

fn parse_credential(args: &[String]) -> anyhow::Result<NewCredential> {
    Ok(NewCredential {
        name: args[0].clone(),
        provider_name: args[1].clone(),
        model_name: args[2].clone(),
        api_key: args[3].clone(),
        temperature: args.get(4).map(|v| v.parse()).transpose()?.unwrap_or(0.7),
        max_tokens: args.get(5).map(|v| v.parse()).transpose()?.unwrap_or(1000),
        is_default: args
            .get(6)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(true),
    })
}
