//! Configuration loaded from the environment (and `.env`, when present).

use std::collections::HashMap;
use std::path::Path;

use crate::error::RelayError;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Settings for the model gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl RelayConfig {
    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self, RelayError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from a specific env file. Process environment wins over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let path = path.as_ref();
        let unreadable =
            |e: dotenvy::Error| RelayError::Configuration(format!("{}: {e}", path.display()));
        let entries = dotenvy::from_path_iter(path)
            .map_err(unreadable)?
            .collect::<Result<HashMap<String, String>, _>>()
            .map_err(unreadable)?;
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| entries.get(key).cloned()))
    }

    /// Resolve settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let max_tokens = match non_empty("TOOLRELAY_MAX_TOKENS") {
            Some(raw) => raw.trim().parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                RelayError::Configuration(format!(
                    "TOOLRELAY_MAX_TOKENS must be a positive integer, got '{raw}'"
                ))
            })?,
            None => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            api_key: non_empty("ANTHROPIC_API_KEY"),
            base_url: non_empty("ANTHROPIC_BASE_URL"),
            model: non_empty("TOOLRELAY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
        })
    }

    /// The API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, RelayError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| RelayError::Configuration("Missing ANTHROPIC_API_KEY".into()))
    }
}
