//! Provider adapters over the translation backends.

use crate::domain::model::{ProviderId, ProviderOutcome, Settings, TranslatedText, TranslationRequest};
use crate::domain::traits::{GeminiBackend, GoogleBackend, ProviderAdapter};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const GOOGLE_SERVICE: &str = "Google (Free)";

/// Google web translation. Always enabled.
pub struct GoogleAdapter {
    backend: Arc<dyn GoogleBackend>,
}

impl GoogleAdapter {
    pub fn new(backend: Arc<dyn GoogleBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn id(&self, _settings: &Settings) -> ProviderId {
        ProviderId::new("google")
    }

    fn error_context(&self) -> &'static str {
        "Google Translate"
    }

    fn is_enabled(&self, _settings: &Settings) -> bool {
        true
    }

    async fn attempt(&self, request: &TranslationRequest, settings: &Settings) -> ProviderOutcome {
        let id = self.id(settings);
        let result = self
            .backend
            .translate_google(
                &request.source_text,
                &request.effective_target_language,
                request.detected_language.source_hint(),
            )
            .await;

        match result {
            Ok(text) => ProviderOutcome::succeeded(
                id,
                request.generation,
                TranslatedText {
                    text,
                    service: GOOGLE_SERVICE.to_string(),
                },
            ),
            Err(e) => ProviderOutcome::failed(id, request.generation, e.describe()),
        }
    }
}

/// Gemini generative translation. Enabled only with an API key.
pub struct GeminiAdapter {
    backend: Arc<dyn GeminiBackend>,
}

impl GeminiAdapter {
    pub fn new(backend: Arc<dyn GeminiBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn id(&self, settings: &Settings) -> ProviderId {
        let model = if settings.gemini_model_is_auto() {
            "auto"
        } else {
            settings.gemini_model.trim()
        };
        ProviderId::new(format!("gemini:{}", model))
    }

    fn error_context(&self) -> &'static str {
        "Gemini Translation"
    }

    fn is_enabled(&self, settings: &Settings) -> bool {
        settings.gemini_key().is_some()
    }

    async fn attempt(&self, request: &TranslationRequest, settings: &Settings) -> ProviderOutcome {
        let id = self.id(settings);
        let Some(api_key) = settings.gemini_key() else {
            return ProviderOutcome::failed(id, request.generation, "Gemini API key not configured");
        };
        let auto = settings.gemini_model_is_auto();
        let model = (!auto).then(|| settings.gemini_model.trim());

        let result = self
            .backend
            .translate_gemini(
                &request.source_text,
                request.effective_target_language.display_name(),
                api_key,
                model,
            )
            .await;

        match result {
            Ok(translation) => {
                debug!(model = %translation.model_used, "gemini served request");
                let service = if auto {
                    format!("Gemini (auto: {})", translation.model_used)
                } else {
                    format!("Gemini ({})", translation.model_used)
                };
                ProviderOutcome::succeeded(
                    id,
                    request.generation,
                    TranslatedText {
                        text: translation.translated_text,
                        service,
                    },
                )
            }
            Err(e) => ProviderOutcome::failed(id, request.generation, e.describe()),
        }
    }
}

/// Open set of providers. The orchestrator dispatches to every enabled entry.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Google plus Gemini, the stock configuration.
    pub fn standard(google: Arc<dyn GoogleBackend>, gemini: Arc<dyn GeminiBackend>) -> Self {
        Self::new()
            .with(Arc::new(GeminiAdapter::new(gemini)))
            .with(Arc::new(GoogleAdapter::new(google)))
    }

    pub fn with(mut self, provider: Arc<dyn ProviderAdapter>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn ProviderAdapter>) {
        self.providers.push(provider);
    }

    pub fn enabled(&self, settings: &Settings) -> Vec<Arc<dyn ProviderAdapter>> {
        self.providers
            .iter()
            .filter(|p| p.is_enabled(settings))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::MtError;
    use crate::domain::language::{DetectedLanguage, LanguageCode};
    use crate::domain::model::OutcomeStatus;
    use crate::domain::traits::GeminiTranslation;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGoogle {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl GoogleBackend for RecordingGoogle {
        async fn translate_google(
            &self,
            text: &str,
            target_lang: &LanguageCode,
            source_lang: &str,
        ) -> Result<String, MtError> {
            self.calls
                .lock()
                .unwrap()
                .push((target_lang.to_string(), source_lang.to_string()));
            Ok(format!("[{}] {}", target_lang, text))
        }
    }

    #[derive(Default)]
    struct RecordingGemini {
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl GeminiBackend for RecordingGemini {
        async fn translate_gemini(
            &self,
            _text: &str,
            target_language_name: &str,
            _api_key: &str,
            model: Option<&str>,
        ) -> Result<GeminiTranslation, MtError> {
            self.calls
                .lock()
                .unwrap()
                .push((target_language_name.to_string(), model.map(String::from)));
            if target_language_name == "tlh" {
                return Err(MtError::Api("unsupported".to_string()));
            }
            Ok(GeminiTranslation {
                translated_text: "ok".to_string(),
                model_used: model.unwrap_or("gemini-2.0-flash").to_string(),
            })
        }
    }

    fn request(detected: DetectedLanguage, target: &str) -> TranslationRequest {
        TranslationRequest {
            generation: 3,
            source_text: "Hello".to_string(),
            detected_language: detected,
            effective_target_language: LanguageCode::new(target).unwrap(),
        }
    }

    fn settings(key: Option<&str>, model: &str) -> Settings {
        Settings {
            gemini_api_key: key.map(String::from),
            gemini_model: model.to_string(),
            default_target_language: LanguageCode::default(),
        }
    }

    #[tokio::test]
    async fn test_google_uses_auto_source_when_unknown() {
        let backend = Arc::new(RecordingGoogle::default());
        let adapter = GoogleAdapter::new(backend.clone());
        let outcome = adapter
            .attempt(&request(DetectedLanguage::Unknown, "ja"), &Settings::default())
            .await;

        assert_eq!(outcome.generation, 3);
        match outcome.status {
            OutcomeStatus::Succeeded(t) => assert_eq!(t.service, GOOGLE_SERVICE),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            backend.calls.lock().unwrap()[0],
            ("ja".to_string(), "auto".to_string())
        );
    }

    #[tokio::test]
    async fn test_gemini_auto_reports_model() {
        let backend = Arc::new(RecordingGemini::default());
        let adapter = GeminiAdapter::new(backend.clone());
        let s = settings(Some("key"), "auto");
        assert_eq!(adapter.id(&s).as_str(), "gemini:auto");

        let outcome = adapter
            .attempt(&request(DetectedLanguage::from_code("en"), "ja"), &s)
            .await;
        match outcome.status {
            OutcomeStatus::Succeeded(t) => assert_eq!(t.service, "Gemini (auto: gemini-2.0-flash)"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            backend.calls.lock().unwrap()[0],
            ("Japanese".to_string(), None)
        );
    }

    #[tokio::test]
    async fn test_gemini_explicit_model_and_failure() {
        let backend = Arc::new(RecordingGemini::default());
        let adapter = GeminiAdapter::new(backend.clone());
        let s = settings(Some("key"), "gemini-1.5-pro");

        let outcome = adapter
            .attempt(&request(DetectedLanguage::Unknown, "tlh"), &s)
            .await;
        assert!(matches!(outcome.status, OutcomeStatus::Failed(_)));
        assert_eq!(outcome.provider.as_str(), "gemini:gemini-1.5-pro");
        assert_eq!(
            backend.calls.lock().unwrap()[0].1.as_deref(),
            Some("gemini-1.5-pro")
        );
    }

    #[test]
    fn test_registry_filters_gemini_without_key() {
        let registry = ProviderRegistry::standard(
            Arc::new(RecordingGoogle::default()),
            Arc::new(RecordingGemini::default()),
        );
        assert!(ProviderRegistry::new().is_empty());
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.enabled(&settings(None, "auto")).len(), 1);
        assert_eq!(registry.enabled(&settings(Some("k"), "auto")).len(), 2);
    }
}
