use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::planning::{ToolRegistry, ToolSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    /// Base URL for API (optional, for Ollama or custom endpoints)
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Ollama,
    /// Any server exposing the OpenAI chat completions API
    #[serde(rename = "openai-generic")]
    OpenAIGeneric,
    /// No provider; every plan is the fallback plan
    Offline,
}

/// Configuration for the planning pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Seconds to wait for a completion before falling back (default: 60, 0 disables)
    #[serde(default = "default_completion_timeout")]
    pub completion_timeout_secs: u64,

    /// Log composed prompts at debug level (default: false)
    #[serde(default)]
    pub log_prompts: bool,

    /// Tools appended to the built-in catalog
    #[serde(default)]
    pub extra_tools: Vec<ToolSpec>,
}

fn default_completion_timeout() -> u64 {
    60
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            completion_timeout_secs: default_completion_timeout(),
            log_prompts: false,
            extra_tools: Vec::new(),
        }
    }
}

impl PlannerConfig {
    pub fn completion_timeout(&self) -> Option<Duration> {
        match self.completion_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;
        Ok(config_dir.join("inbox-planner").join("config.toml"))
    }

    /// Built-in tools plus any configured extras
    pub fn registry(&self) -> ToolRegistry {
        ToolRegistry::with_extra_tools(self.planner.extra_tools.iter().cloned())
    }
}

impl Default for Config {
    fn default() -> Self {
        // Use OpenAI when a key is available, otherwise plan offline
        let (provider, api_key) = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => (LlmProvider::OpenAI, Some(key)),
            _ => (LlmProvider::Offline, None),
        };

        Self {
            llm: LlmConfig {
                provider,
                api_key,
                model: "gpt-4o".to_string(),
                max_tokens: 4096,
                base_url: None,
                temperature: None,
            },
            planner: PlannerConfig::default(),
        }
    }
}
