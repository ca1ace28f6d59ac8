use crate::domain::error::MtError;
use crate::domain::language::{LanguageCode, DEFAULT_TARGET};
use crate::domain::model::{HistoryEntry, Settings};
use crate::domain::traits::SettingsSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    pub http_proxy: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_limit")]
    pub history_limit: usize,
    #[serde(default = "default_limit")]
    pub error_log_limit: usize,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: true,
            path: None,
            level: "WARN".to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            theme: default_theme(),
            http_proxy: None,
            timeout_ms: default_timeout_ms(),
            history_limit: default_limit(),
            error_log_limit: default_limit(),
            logging: Logging::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Config {
    /// Configured default target; unknown codes fall back to `ja`.
    pub fn default_target(&self) -> LanguageCode {
        match LanguageCode::known(&self.target_language) {
            Some(code) => code,
            None => {
                warn!(
                    target_language = %self.target_language,
                    "unsupported target language in config, using {}",
                    DEFAULT_TARGET
                );
                LanguageCode::default()
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settings(&self) -> Settings {
        Settings {
            gemini_api_key: self.gemini.api_key.clone(),
            gemini_model: self.gemini.model.clone(),
            default_target_language: self.default_target(),
        }
    }

    /// Fills values from the environment that the file leaves empty.
    pub fn apply_env(&mut self) {
        let key_missing = self
            .gemini
            .api_key
            .as_deref()
            .map(|k| k.trim().is_empty())
            .unwrap_or(true);
        if key_missing {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                if !key.trim().is_empty() {
                    self.gemini.api_key = Some(key);
                }
            }
        }
    }
}

// Defaults
fn default_target_language() -> String {
    DEFAULT_TARGET.to_string()
}
fn default_theme() -> String {
    "temp".to_string()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_limit() -> usize {
    100
}
fn default_gemini_model() -> String {
    "auto".to_string()
}
fn default_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "WARN".to_string()
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mtrans").join("config.toml"))
}

/// Get database path (uses config directory by default)
pub fn get_database_path() -> PathBuf {
    // ~/.config/mtrans/mtrans.db (Linux)
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mtrans")
        .join("mtrans.db")
}

pub fn load_config() -> Result<Config, MtError> {
    let mut config = match get_config_path() {
        Some(path) if path.exists() => load_config_from(&path)?,
        _ => Config::default(),
    };
    config.apply_env();
    Ok(config)
}

/// Reads a config file; a malformed file yields defaults with a warning.
pub fn load_config_from(path: &Path) -> Result<Config, MtError> {
    let content = fs::read_to_string(path)?;
    match toml::from_str::<Config>(&content) {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to parse config file: {}. Using defaults.",
                e
            );
            Ok(Config::default())
        }
    }
}

pub fn generate_config_sample() -> Result<(), MtError> {
    let Some(path) = get_config_path() else {
        return Err(MtError::Config(
            "Cannot determine config directory".to_string(),
        ));
    };

    if path.exists() {
        eprintln!("Config file already exists at: {}", path.display());
        return Ok(());
    }
    write_config_sample(&path)?;
    println!("Generated config file at: {}", path.display());
    Ok(())
}

pub fn write_config_sample(path: &Path) -> Result<(), MtError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let sample = Config::default();
    let toml_content = toml::to_string_pretty(&sample)
        .map_err(|e| MtError::Config(format!("Failed to serialize config: {}", e)))?;
    fs::write(path, toml_content)
        .map_err(|e| MtError::Config(format!("Failed to write config file: {}", e)))?;
    Ok(())
}

/// [`SettingsSource`] backed by the live configuration.
#[derive(Clone)]
pub struct ConfigSettings {
    config: Arc<RwLock<Config>>,
}

impl ConfigSettings {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SettingsSource for ConfigSettings {
    async fn get_settings(&self) -> Settings {
        self.config.read().await.settings()
    }

    fn notify_history_added(&self, entry: &HistoryEntry) {
        debug!(id = %entry.id, translations = entry.translations.len(), "history entry added");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
target_language = "fr"

[gemini]
api_key = "abc"
"#,
        )
        .unwrap();
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.gemini.model, "auto");
        assert_eq!(config.logging.level, "WARN");

        let settings = config.settings();
        assert_eq!(settings.default_target_language.as_str(), "fr");
        assert_eq!(settings.gemini_key(), Some("abc"));
    }

    #[test]
    fn test_unknown_target_falls_back() {
        let config = Config {
            target_language: "xx".to_string(),
            ..Config::default()
        };
        assert_eq!(config.default_target().as_str(), "ja");
    }

    #[tokio::test]
    async fn test_settings_follow_config_changes() {
        let config = Arc::new(RwLock::new(Config::default()));
        let source = ConfigSettings::new(config.clone());
        assert!(source.get_settings().await.gemini_key().is_none());

        config.write().await.gemini.api_key = Some("key".to_string());
        assert_eq!(source.get_settings().await.gemini_key(), Some("key"));
    }
}
