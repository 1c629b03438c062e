//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.toolchat/config.json`) and environment.
//! The completion endpoint settings can come entirely from `BASE_URL`, `API_KEY` and `MODEL_NAME`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::transcript::RetentionPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Completion endpoint settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// How the tool provider process is started.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Transcript history options.
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

/// OpenAI-compatible endpoint settings. Each field is overridden by its environment variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// Base URL including the version segment (e.g. "https://api.openai.com/v1"). Overridden by BASE_URL.
    pub base_url: Option<String>,
    /// Bearer token. Overridden by API_KEY.
    pub api_key: Option<String>,
    /// Model identifier sent with every request. Overridden by MODEL_NAME.
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Optional interpreter used to start the provider (e.g. "python" for a script path). When unset, the path is executed directly.
    pub launcher: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptConfig {
    /// "keepToolRequest" (default) or "finalOnly".
    #[serde(default)]
    pub retention: RetentionPolicy,
}

/// Endpoint settings after applying environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Resolve endpoint settings: env (via `lookup`) overrides the config file; empty values count as unset.
pub fn resolve_llm_settings_with<F>(config: &Config, lookup: F) -> LlmSettings
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |var: &str, configured: &Option<String>| {
        lookup(var)
            .and_then(|s| non_empty(&s))
            .or_else(|| configured.as_deref().and_then(non_empty))
    };
    let base_url = pick("BASE_URL", &config.llm.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let api_key = pick("API_KEY", &config.llm.api_key);
    let model = pick("MODEL_NAME", &config.llm.model).unwrap_or_else(|| {
        log::warn!("config: no model configured (set MODEL_NAME or llm.model); completion calls will fail");
        String::new()
    });
    LlmSettings {
        base_url,
        api_key,
        model,
    }
}

/// Resolve endpoint settings from the process environment and config.
pub fn resolve_llm_settings(config: &Config) -> LlmSettings {
    resolve_llm_settings_with(config, |k| std::env::var(k).ok())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("TOOLCHAT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".toolchat").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
