use crate::application::completion::Completion;
use crate::domain::model::{ErrorLogEntry, HistoryEntry, TranslationItem};
use crate::presentation::theme::Theme;
use chrono::{DateTime, Local};
use std::fmt::Write;

/// Everything needed to draw one finished request.
pub struct TranslationView<'a> {
    pub text: &'a str,
    pub detected: &'a str,
    pub target: &'a str,
    pub results: &'a [TranslationItem],
    pub completion: Option<&'a Completion>,
}

pub fn format_translation(view: &TranslationView<'_>, theme: &Theme) -> String {
    let mut output = String::new();

    writeln!(output, "{}", (theme.title)(&preview(view.text, 60))).ok();
    writeln!(
        output,
        "  {}",
        (theme.lang)(&format!("{} → {}", view.detected, view.target))
    )
    .ok();
    writeln!(output, "  {}", (theme.line)(&"⸺".repeat(40))).ok();

    if view.results.is_empty() {
        writeln!(output, "  {}", (theme.error)("No translation available (see --errors)")).ok();
    }
    for item in view.results {
        writeln!(output, "  {}", (theme.service)(&item.service)).ok();
        for line in item.result.lines() {
            writeln!(output, "    {}", (theme.result)(line)).ok();
        }
    }

    if let Some(Completion::ForcedCompleted { abandoned }) = view.completion {
        if !abandoned.is_empty() {
            let names: Vec<&str> = abandoned.iter().map(|p| p.as_str()).collect();
            writeln!(
                output,
                "  {}",
                (theme.meta)(&format!("timed out: {}", names.join(", ")))
            )
            .ok();
        }
    }

    writeln!(output).ok();
    output
}

pub fn format_history(entries: &[HistoryEntry], theme: &Theme) -> String {
    let mut output = String::new();
    if entries.is_empty() {
        writeln!(output, "{}", (theme.meta)("History is empty")).ok();
        return output;
    }

    for entry in entries {
        writeln!(
            output,
            "{}  {}  {}",
            (theme.meta)(&format_timestamp(entry.timestamp)),
            (theme.lang)(&format!(
                "{} → {}",
                entry.detected_language, entry.target_language
            )),
            (theme.title)(&preview(&entry.original_text, 50))
        )
        .ok();
        for item in &entry.translations {
            writeln!(
                output,
                "    {} {}",
                (theme.service)(&format!("{}:", item.service)),
                (theme.result)(&preview(&item.result, 70))
            )
            .ok();
        }
    }
    output
}

pub fn format_errors(entries: &[ErrorLogEntry], theme: &Theme) -> String {
    let mut output = String::new();
    if entries.is_empty() {
        writeln!(output, "{}", (theme.meta)("No errors recorded")).ok();
        return output;
    }

    for entry in entries {
        writeln!(
            output,
            "{}  {}  {}",
            (theme.meta)(&format_timestamp(entry.timestamp)),
            (theme.service)(&entry.context),
            (theme.error)(&entry.error)
        )
        .ok();
    }
    output
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// First `max` characters on one line, with an ellipsis when cut.
fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ProviderId;

    fn plain() -> Theme {
        colored::control::set_override(false);
        Theme::from_name("temp")
    }

    #[test]
    fn test_preview_truncates_by_chars() {
        assert_eq!(preview("a  b\nc", 10), "a b c");
        assert_eq!(preview("日本語のテキスト", 3), "日本語…");
    }

    #[test]
    fn test_translation_block_lists_results_in_order() {
        let results = vec![
            TranslationItem {
                service: "Gemini (auto: gemini-2.0-flash)".to_string(),
                result: "こんにちは".to_string(),
            },
            TranslationItem {
                service: "Google (Free)".to_string(),
                result: "やあ".to_string(),
            },
        ];
        let completion = Completion::ForcedCompleted {
            abandoned: vec![ProviderId::new("deepl")],
        };
        let out = format_translation(
            &TranslationView {
                text: "Hello",
                detected: "en",
                target: "ja",
                results: &results,
                completion: Some(&completion),
            },
            &plain(),
        );
        let gemini = out.find("Gemini").unwrap();
        let google = out.find("Google").unwrap();
        assert!(gemini < google);
        assert!(out.contains("en → ja"));
        assert!(out.contains("timed out: deepl"));
    }

    #[test]
    fn test_empty_lists() {
        let theme = plain();
        assert!(format_history(&[], &theme).contains("History is empty"));
        assert!(format_errors(&[], &theme).contains("No errors recorded"));
    }
}
