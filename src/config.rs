use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::SmartPlateResult;

/// Published dev address of the SmartPlate API.
pub const DEFAULT_API_BASE: &str = "http://localhost:5052";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the SmartPlate service, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

impl AppConfig {
    /// Effective base URL: `SMARTPLATE_API_BASE` wins over config.toml.
    pub fn api_base(&self) -> String {
        std::env::var("SMARTPLATE_API_BASE").unwrap_or_else(|_| self.api.base_url.clone())
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in working directory");
            return Some(candidate);
        }
    }

    None
}

/// Load config.toml from next to the executable or the working directory,
/// falling back to defaults when no file exists.
pub fn load_config() -> SmartPlateResult<AppConfig> {
    let Some(path) = resolve_config_path() else {
        tracing::debug!("no config.toml found, using defaults");
        return Ok(AppConfig::default());
    };
    let content = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), base_url = %config.api.base_url, "config loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_sections_missing() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE);
    }

    #[test]
    fn base_url_parses_from_toml() {
        let config: AppConfig =
            toml::from_str("[api]\nbase_url = \"https://api.example.com\"\n").unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
    }
}
