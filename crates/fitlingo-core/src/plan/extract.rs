//! Defensive extraction of a JSON plan from raw generator text.
//!
//! Generators tend to wrap JSON in markdown fences or quote markers.
//! [`strip_fences`] removes those wrapper lines; [`extract_plan`] then parses
//! what is left. No shape validation happens here: a structurally valid but
//! semantically odd plan is passed through as-is.

use serde_json::Value;

/// Opening lines that may carry a language tag, compared lowercased.
const FENCE_OPENERS: [&str; 3] = ["json", "```json", "'''json"];

/// Bare fence or quote marker lines.
const FENCE_MARKERS: [&str; 3] = ["\"\"\"", "'''", "```"];

/// Extraction failure. `raw` is the cleaned text that failed to parse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("could not parse response: {reason}")]
pub struct ExtractionFailure {
    /// Parser diagnostic.
    pub reason: String,
    pub raw: String,
}

pub type ExtractionResult = Result<Value, ExtractionFailure>;

/// Line boundaries: `\n`, `\r\n`, a lone `\r`, and the other Unicode
/// line and record separators.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' && chars.next_if(|&(_, next)| next == '\n').is_some() {
            start += 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Remove fence lines from the top and bottom of `text`.
///
/// Leading language-tagged openers go first, then leading bare markers,
/// then trailing bare markers. Each pass loops so stacked fences are all
/// removed. Remaining lines are rejoined with `\n`.
pub fn strip_fences(text: &str) -> String {
    let lines = split_lines(text);
    let mut body: &[&str] = &lines;

    while let Some((first, rest)) = body.split_first() {
        if !FENCE_OPENERS.contains(&first.trim().to_lowercase().as_str()) {
            break;
        }
        body = rest;
    }
    while let Some((first, rest)) = body.split_first() {
        if !FENCE_MARKERS.contains(&first.trim()) {
            break;
        }
        body = rest;
    }
    while let Some((last, rest)) = body.split_last() {
        if !FENCE_MARKERS.contains(&last.trim()) {
            break;
        }
        body = rest;
    }

    body.join("\n")
}

/// Strip fences from `text` and parse the remainder as JSON.
pub fn extract_plan(text: &str) -> ExtractionResult {
    let cleaned = strip_fences(text);
    serde_json::from_str(&cleaned).map_err(|e| ExtractionFailure {
        reason: e.to_string(),
        raw: cleaned,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn split_lines_handles_every_break() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\u{2028}b\x0cc\u{85}d"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn fences_separated_by_carriage_returns_are_stripped() {
        let plan = extract_plan("```json\r{\"days\":[]}\r```").unwrap();
        assert_eq!(plan, json!({"days": []}));

        let crlf = extract_plan("```json\r\n{\"days\":[]}\r\n```\r\n").unwrap();
        assert_eq!(crlf, json!({"days": []}));
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let plan = extract_plan("```json\n{\"days\":[]}\n```").unwrap();
        assert_eq!(plan, json!({"days": []}));
    }

    #[test]
    fn fenced_and_bare_parse_identically() {
        let inner = "{\n  \"days\": [\n    {\"day-number\": 1, \"workouts\": []}\n  ]\n}";
        let fenced = format!("```json\n{inner}\n```");
        assert_eq!(extract_plan(&fenced), extract_plan(inner));
        assert_eq!(strip_fences(&fenced), inner);
    }

    #[test]
    fn unfenced_text_matches_direct_parse() {
        let text = r#"{"days": [{"day-name": "legs"}], "extra": 1}"#;
        let direct: Value = serde_json::from_str(text).unwrap();
        assert_eq!(extract_plan(text).unwrap(), direct);
        assert_eq!(strip_fences(text), text);
    }

    #[test]
    fn plain_text_fails_with_raw_preserved() {
        let failure = extract_plan("not json at all").unwrap_err();
        assert_eq!(failure.raw, "not json at all");
        assert!(!failure.reason.is_empty());
    }

    #[test]
    fn malformed_json_keeps_cleaned_text() {
        let text = "```json\n{\"days\": [1, 2,]}\n```";
        let failure = extract_plan(text).unwrap_err();
        assert_eq!(failure.raw, "{\"days\": [1, 2,]}");
        assert!(failure.to_string().starts_with("could not parse response: "));
    }

    #[test]
    fn empty_input_fails() {
        assert!(extract_plan("").is_err());
        let failure = extract_plan("```json\n```").unwrap_err();
        assert_eq!(failure.raw, "");
    }

    #[test]
    fn stacked_fences_are_all_removed() {
        let text = "json\n```json\n```\n'''\n{\"days\": []}\n```\n\"\"\"\n";
        assert_eq!(strip_fences(text), "{\"days\": []}");
    }

    #[test]
    fn opener_match_is_case_insensitive_and_trimmed() {
        assert_eq!(strip_fences("  ```JSON  \n[]\n ``` "), "[]");
        assert_eq!(strip_fences("JSON\n{}"), "{}");
    }

    #[test]
    fn tagged_opener_after_bare_marker_is_kept() {
        // Openers are only stripped before bare markers, never after.
        let cleaned = strip_fences("```\njson\n{}\n```");
        assert_eq!(cleaned, "json\n{}");
        assert!(extract_plan("```\njson\n{}\n```").is_err());
    }

    #[test]
    fn interior_fences_are_untouched() {
        let text = "{\"note\": \"a\"}\n```\ntrailing prose";
        assert_eq!(strip_fences(text), text);
    }

    #[test]
    fn no_shape_validation_on_success() {
        assert_eq!(extract_plan("[1, 2, 3]").unwrap(), json!([1, 2, 3]));
        assert_eq!(extract_plan("\"days\"").unwrap(), json!("days"));
    }
}
