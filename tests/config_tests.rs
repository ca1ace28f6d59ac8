//! 配置功能测试

use mtrans::domain::language::LanguageCode;
use mtrans::domain::traits::SettingsSource;
use mtrans::infrastructure::config::{load_config_from, write_config_sample, Config, ConfigSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.target_language, "ja");
    assert_eq!(config.theme, "temp");
    assert_eq!(config.timeout(), Duration::from_millis(10_000));
    assert_eq!(config.history_limit, 100);
    assert_eq!(config.error_log_limit, 100);
    assert!(config.http_proxy.is_none());
    assert_eq!(config.gemini.model, "auto");
    assert!(config.logging.enable);
    assert_eq!(config.logging.level, "WARN");
}

#[test]
fn test_config_toml_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
target_language = "fr"
theme = "canvas"
timeout_ms = 2500
history_limit = 20

[gemini]
api_key = "  secret  "
model = "gemini-1.5-pro"

[logging]
enable = true
path = "/tmp/mtrans.log"
level = "DEBUG"
"#,
    )
    .unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.theme, "canvas");
    assert_eq!(config.timeout(), Duration::from_millis(2500));
    assert_eq!(config.history_limit, 20);
    assert_eq!(config.error_log_limit, 100);
    assert_eq!(config.logging.level, "DEBUG");
    assert_eq!(config.logging.path.as_deref(), Some("/tmp/mtrans.log"));

    let settings = config.settings();
    assert_eq!(settings.default_target_language, LanguageCode::new("fr").unwrap());
    assert_eq!(settings.gemini_key(), Some("secret"));
    assert!(!settings.gemini_model_is_auto());
}

#[test]
fn test_unsupported_target_falls_back() {
    let config = Config {
        target_language: "tlh".to_string(),
        ..Config::default()
    };
    assert_eq!(config.default_target(), LanguageCode::new("ja").unwrap());
}

#[test]
fn test_malformed_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "timeout_ms = \"soon\"\n[[[").unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.timeout_ms, 10_000);
}

#[test]
fn test_sample_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    write_config_sample(&path).unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.target_language, "ja");
    assert_eq!(config.gemini.model, "auto");
}

#[tokio::test]
async fn test_settings_follow_live_config() {
    let config = Arc::new(RwLock::new(Config::default()));
    let source = ConfigSettings::new(config.clone());
    assert!(source.get_settings().await.gemini_key().is_none());

    config.write().await.gemini.api_key = Some("k".to_string());
    assert_eq!(source.get_settings().await.gemini_key(), Some("k"));
}
