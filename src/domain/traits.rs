use crate::domain::error::MtError;
use crate::domain::language::{DetectedLanguage, LanguageCode};
use crate::domain::model::{HistoryEntry, ProviderId, ProviderOutcome, Settings, TranslationRequest};
use async_trait::async_trait;

/// Language detection backend.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    async fn detect_language(&self, text: &str) -> Result<DetectedLanguage, MtError>;
}

/// Google web translation backend.
#[async_trait]
pub trait GoogleBackend: Send + Sync {
    /// `source_lang` is a language code or `auto`.
    async fn translate_google(
        &self,
        text: &str,
        target_lang: &LanguageCode,
        source_lang: &str,
    ) -> Result<String, MtError>;
}

/// Result of a Gemini call, including the model that actually served it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiTranslation {
    pub translated_text: String,
    pub model_used: String,
}

/// Gemini generative backend.
#[async_trait]
pub trait GeminiBackend: Send + Sync {
    /// `model` of `None` means "pick automatically".
    async fn translate_gemini(
        &self,
        text: &str,
        target_language_name: &str,
        api_key: &str,
        model: Option<&str>,
    ) -> Result<GeminiTranslation, MtError>;
}

/// A translation provider as seen by the orchestrator.
///
/// Adapters catch their own failures: `attempt` always returns a settled
/// outcome, never an error.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable id for this provider under the given settings.
    fn id(&self, settings: &Settings) -> ProviderId;

    /// Context label written to the error log on failure.
    fn error_context(&self) -> &'static str;

    /// Whether the provider should be dispatched at all.
    fn is_enabled(&self, settings: &Settings) -> bool;

    async fn attempt(&self, request: &TranslationRequest, settings: &Settings) -> ProviderOutcome;
}

/// Read access to settings plus presentation notifications.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn get_settings(&self) -> Settings;

    /// Called after a history entry has been persisted.
    fn notify_history_added(&self, _entry: &HistoryEntry) {}
}

/// Byte blobs by key; the persisted backing of the bounded stores.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MtError>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), MtError>;

    async fn remove(&self, key: &str) -> Result<(), MtError>;
}
