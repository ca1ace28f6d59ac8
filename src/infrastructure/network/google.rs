use crate::domain::error::MtError;
use crate::domain::language::{DetectedLanguage, LanguageCode};
use crate::domain::model::redact;
use crate::domain::traits::{GoogleBackend, LanguageDetector};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const GOOGLE_TRANSLATE_URL: &str = "https://translate.google.com/translate_a/single";
const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(10);
const DETECT_TIMEOUT: Duration = Duration::from_secs(8);

// Google web API response (dj=1)
#[derive(Deserialize, Debug)]
struct GoogleResponse {
    #[serde(default)]
    sentences: Vec<Sentence>,
}

#[derive(Deserialize, Debug)]
struct Sentence {
    trans: Option<String>,
}

/// Google web translation endpoint, no API key required.
/// Also serves language detection.
#[derive(Clone)]
pub struct GoogleWebClient {
    client: Client,
    base_url: String,
}

impl GoogleWebClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, GOOGLE_TRANSLATE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl GoogleBackend for GoogleWebClient {
    async fn translate_google(
        &self,
        text: &str,
        target_lang: &LanguageCode,
        source_lang: &str,
    ) -> Result<String, MtError> {
        debug!(text = %redact(text), source_lang, target_lang = %target_lang, "google translate");

        let target = target_lang.as_str();
        let params = [
            ("client", "gtx"),
            ("sl", source_lang),
            ("tl", target),
            ("hl", target),
            ("dt", "t"),
            ("dt", "bd"),
            ("dj", "1"),
            ("source", "input"),
            ("q", text),
        ];

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .timeout(TRANSLATE_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MtError::Api(format!(
                "Google Translate request failed with status: {}",
                status
            )));
        }

        let body = response.json::<GoogleResponse>().await?;
        parse_sentences(body)
    }
}

#[async_trait]
impl LanguageDetector for GoogleWebClient {
    async fn detect_language(&self, text: &str) -> Result<DetectedLanguage, MtError> {
        let params = [
            ("client", "gtx"),
            ("sl", "auto"),
            ("tl", "en"),
            ("dt", "t"),
            ("q", text),
        ];

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .timeout(DETECT_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MtError::Detection(format!(
                "request failed with status: {}",
                status
            )));
        }

        let body = response.json::<serde_json::Value>().await?;
        let detected = parse_detected(&body)?;
        debug!(detected = %detected, "language detected");
        Ok(detected)
    }
}

fn parse_sentences(body: GoogleResponse) -> Result<String, MtError> {
    let result: String = body.sentences.into_iter().filter_map(|s| s.trans).collect();
    if result.is_empty() {
        return Err(MtError::Api("Translation not found in response".to_string()));
    }
    Ok(result)
}

// Response format: [[["translation", ...], ...], null, "detected_lang", ...]
fn parse_detected(body: &serde_json::Value) -> Result<DetectedLanguage, MtError> {
    body.as_array()
        .and_then(|arr| arr.get(2))
        .and_then(|v| v.as_str())
        .map(DetectedLanguage::from_code)
        .ok_or_else(|| MtError::Detection("Failed to detect language from response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_sentences_joins_parts() {
        let body: GoogleResponse = serde_json::from_value(json!({
            "sentences": [
                {"trans": "こんにちは、", "orig": "Hello, "},
                {"trans": "これはテストです。", "orig": "this is a test."},
                {"translit": "Kon'nichiwa"}
            ],
            "src": "en"
        }))
        .unwrap();
        assert_eq!(parse_sentences(body).unwrap(), "こんにちは、これはテストです。");
    }

    #[test]
    fn test_parse_sentences_empty_is_error() {
        let body: GoogleResponse = serde_json::from_value(json!({"src": "en"})).unwrap();
        assert!(matches!(parse_sentences(body), Err(MtError::Api(_))));
    }

    #[test]
    fn test_parse_detected() {
        let body = json!([[["Hallo", "Hello", null, null, 10]], null, "de", null]);
        assert_eq!(
            parse_detected(&body).unwrap(),
            DetectedLanguage::from_code("de")
        );
        assert!(parse_detected(&json!({"error": 1})).is_err());
        assert!(parse_detected(&json!([[], null])).is_err());
    }
}
