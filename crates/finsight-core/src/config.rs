use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::provider::Provider;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// On-disk configuration. Every field is optional; environment variables
/// and command-line flags take precedence.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub claude_api_key: Option<String>,
    pub ollama_url: Option<String>,
}

/// Values picked on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
}

/// Fully resolved settings for one session
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub provider: Provider,
    pub model: String,
    pub api_key: Option<String>,
    pub ollama_url: String,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file (if any) and a `.env` file from the working directory
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("finsight").join("config.json"))
    }

    pub fn resolve(&self, overrides: &Overrides) -> Result<Settings, ConfigError> {
        self.resolve_with(overrides, |name| std::env::var(name).ok())
    }

    /// Precedence: command line, then environment, then config file, then defaults
    pub fn resolve_with<F>(&self, overrides: &Overrides, env: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let provider = match overrides
            .provider
            .clone()
            .or_else(|| env("FINSIGHT_PROVIDER"))
            .or_else(|| self.provider.clone())
        {
            Some(name) => Provider::parse(&name)?,
            None => Provider::default(),
        };

        let model = overrides
            .model
            .clone()
            .or_else(|| env("FINSIGHT_MODEL"))
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| provider.default_model().to_string());

        let api_key = match provider {
            Provider::Gemini => env("GEMINI_API_KEY")
                .or_else(|| env("API_KEY"))
                .or_else(|| self.gemini_api_key.clone()),
            Provider::OpenAI => env("OPENAI_API_KEY").or_else(|| self.openai_api_key.clone()),
            Provider::Claude => env("ANTHROPIC_API_KEY").or_else(|| self.claude_api_key.clone()),
            Provider::Ollama => None,
        };

        if provider.key_env_var().is_some() && api_key.is_none() {
            return Err(ConfigError::MissingApiKey(provider));
        }

        let ollama_url = env("OLLAMA_HOST")
            .or_else(|| self.ollama_url.clone())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Settings {
            provider,
            model,
            api_key,
            ollama_url,
        })
    }
}
