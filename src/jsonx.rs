//! Best-effort JSON extraction from LLM chat responses.
//!
//! Models wrap JSON in prose and markdown fences despite instructions not
//! to. These helpers carve out the first-`{`-to-last-`}` span and strip
//! fences before handing the payload to serde.

use serde::de::DeserializeOwned;

use crate::error::{PlanError, PlanResult};

/// Strip a leading ```` ```json ```` / ```` ``` ```` fence and a trailing
/// ```` ``` ```` fence, if present. Returns the trimmed inner text.
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Extract the span from the first `{` to the last `}` inclusive.
///
/// Returns `None` when no such span exists. This is deliberately naive:
/// it tolerates prose around the object but not multiple top-level objects.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse a model response into `T`, tolerating fences and surrounding prose.
pub fn parse_lenient<T: DeserializeOwned>(response: &str) -> PlanResult<T> {
    let unfenced = strip_code_fences(response);
    let payload = extract_json_object(unfenced)
        .ok_or_else(|| PlanError::ParseFailure("no JSON object in response".to_string()))?;
    serde_json::from_str(payload).map_err(|e| PlanError::ParseFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        a: i64,
        b: String,
    }

    #[test]
    fn bare_json_parses() {
        let p: Pair = parse_lenient(r#"{"a": 1, "b": "x"}"#).unwrap();
        assert_eq!(p, Pair { a: 1, b: "x".into() });
    }

    #[test]
    fn prose_wrapped_json_parses() {
        let text = "Here is the result you asked for:\n{\"a\": 2, \"b\": \"y\"}\nHope that helps!";
        let p: Pair = parse_lenient(text).unwrap();
        assert_eq!(p.a, 2);
    }

    #[test]
    fn fenced_json_parses() {
        let text = "```json\n{\"a\": 3, \"b\": \"z\"}\n```";
        let p: Pair = parse_lenient(text).unwrap();
        assert_eq!(p.a, 3);
        assert_eq!(p.b, "z");
    }

    #[test]
    fn fence_without_language_tag() {
        let text = "```\n{\"a\": 4, \"b\": \"w\"}\n```";
        let p: Pair = parse_lenient(text).unwrap();
        assert_eq!(p.a, 4);
    }

    #[test]
    fn no_braces_is_parse_failure() {
        let err = parse_lenient::<Pair>("sorry, I cannot do that").unwrap_err();
        assert!(matches!(err, PlanError::ParseFailure(_)));
    }

    #[test]
    fn malformed_json_is_parse_failure() {
        let err = parse_lenient::<Pair>("{\"a\": oops}").unwrap_err();
        assert!(matches!(err, PlanError::ParseFailure(_)));
    }

    #[test]
    fn extract_spans_first_to_last_brace() {
        let text = "x {\"a\": {\"nested\": true}} y";
        assert_eq!(extract_json_object(text), Some("{\"a\": {\"nested\": true}}"));
    }

    #[test]
    fn reversed_braces_yield_none() {
        assert_eq!(extract_json_object("} nothing here {"), None);
    }
}
