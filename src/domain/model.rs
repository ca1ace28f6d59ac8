use crate::domain::language::{DetectedLanguage, LanguageCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic id of one submission.
pub type Generation = u64;

// 一次翻译请求，目标语言在派发时确定
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub generation: Generation,
    pub source_text: String,
    pub detected_language: DetectedLanguage,
    pub effective_target_language: LanguageCode,
}

/// Settings snapshot read once per submission.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    /// `auto` or an explicit model name.
    pub gemini_model: String,
    pub default_target_language: LanguageCode,
}

impl Settings {
    pub fn gemini_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn gemini_model_is_auto(&self) -> bool {
        let model = self.gemini_model.trim();
        model.is_empty() || model.eq_ignore_ascii_case("auto")
    }
}

/// Provider identity, e.g. `google` or `gemini:auto`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text produced by a provider plus the service label shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedText {
    pub text: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    Succeeded(TranslatedText),
    Failed(String),
}

// 单个服务在某一代请求中的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutcome {
    pub provider: ProviderId,
    pub generation: Generation,
    pub status: OutcomeStatus,
}

impl ProviderOutcome {
    pub fn succeeded(provider: ProviderId, generation: Generation, text: TranslatedText) -> Self {
        Self {
            provider,
            generation,
            status: OutcomeStatus::Succeeded(text),
        }
    }

    pub fn failed(provider: ProviderId, generation: Generation, error: impl Into<String>) -> Self {
        Self {
            provider,
            generation,
            status: OutcomeStatus::Failed(error.into()),
        }
    }
}

/// One displayed (and persisted) translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationItem {
    pub service: String,
    pub result: String,
}

// 历史记录条目 (字段名与旧版持久化格式一致)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: i64, // 毫秒
    pub original_text: String,
    pub detected_language: String,
    pub target_language: String,
    pub translations: Vec<TranslationItem>,
}

impl HistoryEntry {
    pub fn new(request: &TranslationRequest, translations: Vec<TranslationItem>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            original_text: request.source_text.clone(),
            detected_language: request.detected_language.to_string(),
            target_language: request.effective_target_language.to_string(),
            translations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp: i64,
    pub context: String,
    pub error: String,
}

impl ErrorLogEntry {
    pub fn new(context: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            context: context.into(),
            error: error.into(),
        }
    }
}

/// Redacted form of user text for logs.
pub fn redact(text: &str) -> String {
    format!("<redacted {} chars>", text.chars().count())
}
