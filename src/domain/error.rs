use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API Error: {0}")]
    Api(String),

    #[error("Language detection failed: {0}")]
    Detection(String),
}

impl MtError {
    /// Short, user-facing description used in error log entries.
    pub fn describe(&self) -> String {
        match self {
            MtError::Http(e) if e.is_timeout() => format!("request timed out: {}", e),
            MtError::Http(e) if e.is_connect() => format!("could not connect (offline?): {}", e),
            other => other.to_string(),
        }
    }
}
