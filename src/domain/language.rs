//! Language codes and the target-language policy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the application knows by name. Codes outside this table are
/// still accepted from detection, but only these can be configured as the
/// default target.
pub const KNOWN_LANGUAGES: &[(&str, &str)] = &[
    ("ja", "Japanese"),
    ("en", "English"),
    ("zh", "Chinese"),
    ("ko", "Korean"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
];

pub const DEFAULT_TARGET: &str = "ja";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Builds a code from arbitrary input (lowercased, trimmed).
    /// Returns `None` for empty input and for the `unknown` marker.
    pub fn new(code: &str) -> Option<Self> {
        let code = code.trim().to_lowercase();
        if code.is_empty() || code == "unknown" {
            return None;
        }
        Some(Self(code))
    }

    /// Builds a code only if it is in [`KNOWN_LANGUAGES`].
    pub fn known(code: &str) -> Option<Self> {
        Self::new(code).filter(|c| c.is_known())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        KNOWN_LANGUAGES.iter().any(|(c, _)| *c == self.0)
    }

    /// English display name, falling back to the raw code.
    pub fn display_name(&self) -> &str {
        KNOWN_LANGUAGES
            .iter()
            .find(|(c, _)| *c == self.0)
            .map(|(_, name)| *name)
            .unwrap_or(&self.0)
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self(DEFAULT_TARGET.to_string())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of language detection for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetectedLanguage {
    Detected(LanguageCode),
    #[default]
    Unknown,
}

impl DetectedLanguage {
    pub fn from_code(code: &str) -> Self {
        LanguageCode::new(code)
            .map(DetectedLanguage::Detected)
            .unwrap_or(DetectedLanguage::Unknown)
    }

    pub fn code(&self) -> Option<&LanguageCode> {
        match self {
            DetectedLanguage::Detected(code) => Some(code),
            DetectedLanguage::Unknown => None,
        }
    }

    /// Source hint passed to providers: the code, or `auto`.
    pub fn source_hint(&self) -> &str {
        self.code().map(LanguageCode::as_str).unwrap_or("auto")
    }

    pub fn as_str(&self) -> &str {
        self.code().map(LanguageCode::as_str).unwrap_or("unknown")
    }

    fn is(&self, code: &str) -> bool {
        self.code().is_some_and(|c| c.as_str() == code)
    }
}

impl fmt::Display for DetectedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target-language policy.
pub struct LanguageResolver;

impl LanguageResolver {
    /// Effective target for a request, in priority order: manual override,
    /// the ja/en pair rule, then the configured default.
    pub fn resolve(
        detected: &DetectedLanguage,
        configured_default: &LanguageCode,
        manual_override: Option<&LanguageCode>,
    ) -> LanguageCode {
        if let Some(target) = manual_override {
            return target.clone();
        }
        Self::auto_target(detected, configured_default)
    }

    /// New manual override for a swap action. Toggles between the detected
    /// language and its automatic target. `None` when nothing was detected.
    pub fn swap(
        detected: &DetectedLanguage,
        current_target: &LanguageCode,
        configured_default: &LanguageCode,
    ) -> Option<LanguageCode> {
        let detected_code = detected.code()?;
        if detected_code == current_target {
            Some(Self::auto_target(detected, configured_default))
        } else {
            Some(detected_code.clone())
        }
    }

    fn auto_target(detected: &DetectedLanguage, fallback: &LanguageCode) -> LanguageCode {
        if detected.is("ja") {
            LanguageCode("en".to_string())
        } else if detected.is("en") {
            LanguageCode("ja".to_string())
        } else {
            fallback.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> LanguageCode {
        LanguageCode::new(s).unwrap()
    }

    #[test]
    fn test_pair_rule() {
        let default = code("fr");
        assert_eq!(
            LanguageResolver::resolve(&DetectedLanguage::from_code("ja"), &default, None),
            code("en")
        );
        assert_eq!(
            LanguageResolver::resolve(&DetectedLanguage::from_code("en"), &default, None),
            code("ja")
        );
    }

    #[test]
    fn test_default_for_other_or_unknown() {
        let default = code("de");
        assert_eq!(
            LanguageResolver::resolve(&DetectedLanguage::from_code("ko"), &default, None),
            default
        );
        assert_eq!(
            LanguageResolver::resolve(&DetectedLanguage::Unknown, &default, None),
            default
        );
    }

    #[test]
    fn test_override_wins() {
        let detected = DetectedLanguage::from_code("en");
        let target = LanguageResolver::resolve(&detected, &code("ja"), Some(&code("en")));
        assert_eq!(target, code("en"));
    }

    #[test]
    fn test_swap_toggles() {
        let detected = DetectedLanguage::from_code("en");
        let next = LanguageResolver::swap(&detected, &code("ja"), &code("ja")).unwrap();
        assert_eq!(next, code("en"));

        // Swapping again goes back to the automatic target.
        let back = LanguageResolver::swap(&detected, &next, &code("ja")).unwrap();
        assert_eq!(back, code("ja"));
    }

    #[test]
    fn test_swap_toggles_outside_pair() {
        let detected = DetectedLanguage::from_code("ko");
        let next = LanguageResolver::swap(&detected, &code("fr"), &code("fr")).unwrap();
        assert_eq!(next, code("ko"));

        let back = LanguageResolver::swap(&detected, &next, &code("fr")).unwrap();
        assert_eq!(back, code("fr"));
    }

    #[test]
    fn test_swap_without_detection() {
        assert!(LanguageResolver::swap(&DetectedLanguage::Unknown, &code("ja"), &code("ja")).is_none());
    }

    #[test]
    fn test_codes() {
        assert!(LanguageCode::new("  ").is_none());
        assert!(LanguageCode::new("unknown").is_none());
        assert_eq!(code("EN").as_str(), "en");
        assert!(LanguageCode::known("it").is_none());
        assert_eq!(code("it").display_name(), "it");
        assert_eq!(code("ko").display_name(), "Korean");
        assert_eq!(DetectedLanguage::Unknown.source_hint(), "auto");
    }
}
