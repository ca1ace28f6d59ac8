use crate::domain::error::MtError;
use crate::domain::model::redact;
use crate::domain::traits::{GeminiBackend, GeminiTranslation};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_TIMEOUT: Duration = Duration::from_secs(15);
const LIST_MODELS_TIMEOUT: Duration = Duration::from_secs(10);

/// Used when the model list cannot be fetched.
pub const FALLBACK_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-1.5-pro",
    "gemini-pro",
];

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize, Debug)]
struct ModelInfo {
    name: String,
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    // "auto" resolution per API key, kept for the process lifetime
    resolved_models: Arc<DashMap<String, String>>,
}

impl GeminiClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, GEMINI_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            resolved_models: Arc::new(DashMap::new()),
        }
    }

    async fn fetch_models(&self, api_key: &str) -> Result<Vec<String>, MtError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", api_key)])
            .timeout(LIST_MODELS_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MtError::Api(format!(
                "Gemini model list failed with status {}",
                status
            )));
        }

        let list = response.json::<ModelList>().await?;
        Ok(list
            .models
            .into_iter()
            .filter_map(|m| m.name.strip_prefix("models/").map(String::from))
            .collect())
    }

    /// Latest flash model for this key. A pick from a successful listing is
    /// cached; a pick from [`FALLBACK_MODELS`] is not, so the next call lists
    /// again.
    pub async fn latest_flash_model(&self, api_key: &str) -> Result<String, MtError> {
        if let Some(model) = self.resolved_models.get(api_key) {
            return Ok(model.value().clone());
        }

        match self.fetch_models(api_key).await {
            Ok(models) => {
                let model = pick_latest_flash(&models)
                    .ok_or_else(|| MtError::Api("No flash models found".to_string()))?;
                debug!(model = %model, "resolved auto Gemini model");
                self.resolved_models
                    .insert(api_key.to_string(), model.clone());
                Ok(model)
            }
            Err(e) => {
                warn!(error = %e, "failed to list Gemini models, using fallback list");
                let fallback: Vec<String> = FALLBACK_MODELS.iter().map(|m| m.to_string()).collect();
                pick_latest_flash(&fallback)
                    .ok_or_else(|| MtError::Api("No flash models found".to_string()))
            }
        }
    }
}

#[async_trait]
impl GeminiBackend for GeminiClient {
    async fn translate_gemini(
        &self,
        text: &str,
        target_language_name: &str,
        api_key: &str,
        model: Option<&str>,
    ) -> Result<GeminiTranslation, MtError> {
        let model_name = match model {
            Some(m) => m.to_string(),
            None => self.latest_flash_model(api_key).await?,
        };
        debug!(text = %redact(text), target = target_language_name, model = %model_name, "gemini translate");

        let prompt = build_prompt(text, target_language_name);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, model_name);
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .timeout(GEMINI_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MtError::Api(format!(
                "Gemini API request failed with status {}: {}",
                status, detail
            )));
        }

        let translated_text = parse_generate(response.json::<GenerateResponse>().await?)?;
        Ok(GeminiTranslation {
            translated_text,
            model_used: model_name,
        })
    }
}

/// Flash models whose name contains `gemini`; greatest name wins.
pub fn pick_latest_flash(models: &[String]) -> Option<String> {
    models
        .iter()
        .filter(|m| m.contains("flash") && m.contains("gemini"))
        .max()
        .cloned()
}

fn build_prompt(text: &str, target_language_name: &str) -> String {
    format!(
        concat!(
            "You are a professional translation engine. Translate the user-provided text into {} only.\n",
            "Constraints:\n",
            "- Preserve original formatting, line breaks, markdown, code blocks, and list structure.\n",
            "- Keep placeholders and variables untouched (e.g., {{like_this}}, %s, %d, <tag>, URLs, and file paths).\n",
            "- Do not add explanations or commentary. Output only the translated text.\n",
            "- Maintain numbers, units, punctuation, emojis, and inline symbols.\n",
            "- If the text is mostly code or untranslatable terms, keep them as-is and translate surrounding prose naturally.\n",
            "- Prefer concise, natural, context-appropriate wording.\n",
            "\nText to translate:\n{}"
        ),
        target_language_name, text
    )
}

fn parse_generate(response: GenerateResponse) -> Result<String, MtError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| MtError::Api("Translation not found in Gemini response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pick_latest_flash() {
        let models = names(&[
            "gemini-1.5-pro",
            "gemini-1.5-flash",
            "gemini-2.5-flash",
            "gemini-2.0-flash-exp",
            "text-embedding-004",
        ]);
        assert_eq!(pick_latest_flash(&models).as_deref(), Some("gemini-2.5-flash"));
        assert!(pick_latest_flash(&names(&["gemini-pro"])).is_none());
    }

    #[test]
    fn test_fallback_has_flash() {
        let fallback = names(FALLBACK_MODELS);
        assert_eq!(pick_latest_flash(&fallback).as_deref(), Some("gemini-2.0-flash-exp"));
    }

    #[test]
    fn test_parse_generate() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "こんにちは"}], "role": "model"}}]
        }))
        .unwrap();
        assert_eq!(parse_generate(response).unwrap(), "こんにちは");

        let empty: GenerateResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(parse_generate(empty).is_err());
    }

    #[test]
    fn test_prompt_mentions_target_and_text() {
        let prompt = build_prompt("Hello {name}", "Japanese");
        assert!(prompt.contains("into Japanese only"));
        assert!(prompt.ends_with("Text to translate:\nHello {name}"));
        assert!(prompt.contains("{like_this}"));
    }

    #[tokio::test]
    async fn test_failed_listing_is_not_cached() {
        let client = GeminiClient::with_base_url(Client::new(), "http://127.0.0.1:1/v1beta");
        let model = client.latest_flash_model("k").await.unwrap();
        assert_eq!(model, "gemini-2.0-flash-exp");
        assert!(client.resolved_models.get("k").is_none());
    }

    #[tokio::test]
    async fn test_resolved_model_is_reused() {
        let client = GeminiClient::with_base_url(Client::new(), "http://127.0.0.1:1/v1beta");
        client
            .resolved_models
            .insert("k".to_string(), "gemini-2.5-flash".to_string());
        assert_eq!(client.latest_flash_model("k").await.unwrap(), "gemini-2.5-flash");
        assert!(client.resolved_models.get("other").is_none());
    }
}
