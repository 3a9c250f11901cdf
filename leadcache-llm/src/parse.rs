//! Parsing of model output into an [`EmailDraft`].

use crate::{EmailDraft, GeneratedDraft};

/// Strip a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````).
///
/// Text without a leading fence is returned trimmed but otherwise unchanged.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Interpret model output as a `{subject, body}` object.
///
/// Anything else becomes a fallback draft carrying the raw text.
pub fn parse_draft(text: &str) -> GeneratedDraft {
    match serde_json::from_str::<EmailDraft>(strip_code_fences(text)) {
        Ok(draft) => GeneratedDraft::parsed(draft),
        Err(_) => GeneratedDraft::raw(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_json_fence() {
        let text = "```json\n{\"subject\":\"s\",\"body\":\"b\"}\n```";
        assert_eq!(strip_code_fences(text), "{\"subject\":\"s\",\"body\":\"b\"}");
    }

    #[test]
    fn test_strip_bare_fence() {
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("```json{}```"), "{}");
    }

    #[test]
    fn test_strip_without_fence() {
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_structured() {
        let draft = parse_draft("{\"subject\":\"Hello\",\"body\":\"<p>Hi</p>\"}");
        assert!(!draft.fallback);
        assert_eq!(draft.draft.subject, "Hello");
        assert_eq!(draft.draft.body, "<p>Hi</p>");
    }

    #[test]
    fn test_parse_fenced() {
        let draft = parse_draft("```json\n{\"subject\":\"Hello\",\"body\":\"Hi\"}\n```");
        assert!(!draft.fallback);
        assert_eq!(draft.draft.subject, "Hello");
    }

    #[test]
    fn test_parse_fallback_keeps_raw_text() {
        let draft = parse_draft("Subject: Hello\n\nHi there");
        assert!(draft.fallback);
        assert_eq!(draft.draft.subject, "Subject: Hello\n\nHi there");
        assert_eq!(draft.draft.body, "Subject: Hello\n\nHi there");

        let draft = parse_draft("{\"subject\":\"only\"}");
        assert!(draft.fallback);
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(text in ".{0,200}") {
            let draft = parse_draft(&text);
            if draft.fallback {
                prop_assert_eq!(&draft.draft.subject, &text);
                prop_assert_eq!(&draft.draft.body, &text);
            }
        }
    }
}
