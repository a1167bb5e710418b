use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{LlmConfig, LlmProvider};

pub mod offline;
pub mod openai_compat;

pub use offline::OfflineCompleter;
pub use openai_compat::OpenAiCompatClient;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Text-in, text-out completion service
///
/// The planner treats this as opaque: any error, and any output it cannot parse,
/// counts as a failed planning attempt.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Name used in logs
    fn name(&self) -> &str {
        "completer"
    }
}

/// Create the completer described by the LLM configuration
pub fn create_completer(config: &LlmConfig) -> Result<Arc<dyn Completer>> {
    match config.provider {
        LlmProvider::OpenAI => {
            let api_key = config
                .api_key
                .clone()
                .context("OpenAI API key not set. Set OPENAI_API_KEY or configure api_key")?;
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string());
            Ok(Arc::new(
                OpenAiCompatClient::new(base_url, config.model.clone(), config.max_tokens)
                    .with_api_key(api_key)
                    .with_temperature(config.temperature),
            ))
        }
        LlmProvider::Ollama => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
            tracing::info!("Using Ollama at {}", base_url);
            Ok(Arc::new(
                OpenAiCompatClient::new(base_url, config.model.clone(), config.max_tokens)
                    .with_temperature(config.temperature),
            ))
        }
        LlmProvider::OpenAIGeneric => {
            let base_url = config
                .base_url
                .clone()
                .context("openai-generic requires a base_url to be set in configuration")?;
            tracing::info!("Using generic OpenAI-compatible API at {}", base_url);
            let mut client =
                OpenAiCompatClient::new(base_url, config.model.clone(), config.max_tokens)
                    .with_temperature(config.temperature);
            if let Some(key) = config.api_key.clone() {
                client = client.with_api_key(key);
            }
            Ok(Arc::new(client))
        }
        LlmProvider::Offline => {
            tracing::info!("No completion provider configured, plans will use the fallback");
            Ok(Arc::new(OfflineCompleter))
        }
    }
}
