//! Embedded-payload extraction.
//!
//! A syntactic span finder only: no JSON parsing happens here. The common
//! case is narration with no payload at all.

use regex_lite::Regex;
use std::sync::OnceLock;

/// A control-payload candidate found inside narration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPayload {
    /// The raw payload text (fence interior, or the brace-delimited span).
    pub raw: String,
    /// Whether it came from a fenced ```json block.
    pub fenced: bool,
}

/// Matches a fenced block tagged as JSON, lazily, across newlines.
pub(crate) fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
        Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap()
    })
}

/// Find the embedded control payload in a narrative response, if any.
///
/// 1. A fenced ```json block wins; its interior is returned verbatim.
/// 2. Otherwise the span from the first `{` to its balance-matched `}`.
///    An opening brace that never closes still returns the remainder -
///    the validator will reject it, which is the documented behavior for
///    malformed braces (rejection, not silence).
/// 3. No fence and no brace: no payload.
pub fn extract(text: &str) -> Option<ExtractedPayload> {
    if let Some(captures) = fence_regex().captures(text) {
        let interior = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        return Some(ExtractedPayload {
            raw: interior.to_string(),
            fenced: true,
        });
    }

    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(ExtractedPayload {
                        raw: text[start..end].to_string(),
                        fenced: false,
                    });
                }
            }
            _ => {}
        }
    }

    // Opening brace without a matching close
    Some(ExtractedPayload {
        raw: text[start..].to_string(),
        fenced: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_interior_is_returned_verbatim() {
        let text = "The story unfolds.\n```json\n{\"updates\":[{\"characterName\":\"Sorian\",\"hpChange\":-5}]}\n```";
        let extracted = extract(text).expect("payload found");
        assert!(extracted.fenced);
        assert_eq!(
            extracted.raw,
            "{\"updates\":[{\"characterName\":\"Sorian\",\"hpChange\":-5}]}"
        );
    }

    #[test]
    fn unfenced_balanced_object_is_found() {
        let text = "Scene. { \"updates\": [ { \"characterName\": \"Sorian\", \"hpChange\": -3 } ] } The end.";
        let extracted = extract(text).expect("payload found");
        assert!(!extracted.fenced);
        assert_eq!(
            extracted.raw,
            "{ \"updates\": [ { \"characterName\": \"Sorian\", \"hpChange\": -3 } ] }"
        );
    }

    #[test]
    fn narration_without_braces_has_no_payload() {
        assert_eq!(extract("You walk through a quiet forest."), None);
    }

    #[test]
    fn fence_wins_over_earlier_brace() {
        let text = "A sigil {strange} glows.\n```json\n{\"updates\":[]}\n```";
        let extracted = extract(text).expect("payload found");
        assert!(extracted.fenced);
        assert_eq!(extracted.raw, "{\"updates\":[]}");
    }

    #[test]
    fn unclosed_brace_returns_remainder_for_rejection() {
        let text = "Bad output { \"updates\": [";
        let extracted = extract(text).expect("span returned");
        assert!(!extracted.fenced);
        assert_eq!(extracted.raw, "{ \"updates\": [");
    }

    #[test]
    fn nested_objects_are_matched_to_the_outer_close() {
        let text = "x {\"a\": {\"b\": 1}} y";
        let extracted = extract(text).expect("payload found");
        assert_eq!(extracted.raw, "{\"a\": {\"b\": 1}}");
    }
}
