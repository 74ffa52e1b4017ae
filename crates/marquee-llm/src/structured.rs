//! Structured (JSON) outputs from the generator.
//!
//! Model completions arrive wrapped in markdown fences or prose, or fail to
//! parse at all. [`parse_or_fallback`] makes the recovery policy explicit at
//! each call site: the caller supplies the substitute value, and the
//! [`Outcome`] records whether it was used.

use serde::de::DeserializeOwned;
use tracing::warn;

/// Result of a structured parse attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The completion parsed as `T`.
    Parsed(T),
    /// Parsing failed; the caller-supplied substitute is carried instead.
    FellBack(T),
}

impl<T> Outcome<T> {
    /// The carried value, parsed or substituted.
    pub fn into_inner(self) -> T {
        match self {
            Outcome::Parsed(value) | Outcome::FellBack(value) => value,
        }
    }

    /// True when the substitute value was used.
    pub fn fell_back(&self) -> bool {
        matches!(self, Outcome::FellBack(_))
    }
}

/// Parse `raw` as JSON into `T`, substituting `fallback` on failure.
///
/// `context` names the call site in the warning emitted on fallback.
pub fn parse_or_fallback<T: DeserializeOwned>(raw: &str, fallback: T, context: &str) -> Outcome<T> {
    let candidate = extract_json(raw);
    match serde_json::from_str(candidate) {
        Ok(value) => Outcome::Parsed(value),
        Err(e) => {
            warn!(
                context,
                error = %e,
                "Failed to parse structured output, using fallback"
            );
            Outcome::FellBack(fallback)
        }
    }
}

/// Strip markdown fences and surrounding prose, returning the JSON-looking
/// core of a completion. Slices from the first opening delimiter to the last
/// matching closing one; whichever of `{` or `[` appears first wins.
fn extract_json(raw: &str) -> &str {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let (open, close) = match (cleaned.find('{'), cleaned.find('[')) {
        (Some(obj), Some(arr)) if arr < obj => ('[', ']'),
        (None, Some(_)) => ('[', ']'),
        (Some(_), _) => ('{', '}'),
        (None, None) => return cleaned,
    };
    match (cleaned.find(open), cleaned.rfind(close)) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Decision {
        needed: bool,
    }

    // ---- parse_or_fallback ----

    #[test]
    fn test_parse_clean_json() {
        let outcome = parse_or_fallback(
            r#"{"needed": true}"#,
            Decision { needed: false },
            "test",
        );
        assert_eq!(outcome, Outcome::Parsed(Decision { needed: true }));
        assert!(!outcome.fell_back());
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"needed\": true}\n```";
        let outcome = parse_or_fallback(raw, Decision { needed: false }, "test");
        assert_eq!(outcome.into_inner(), Decision { needed: true });
    }

    #[test]
    fn test_parse_bare_fenced_json() {
        let raw = "```\n{\"needed\": true}\n```";
        let outcome = parse_or_fallback(raw, Decision { needed: false }, "test");
        assert!(!outcome.fell_back());
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = "Sure! Here is the answer:\n{\"needed\": false}\nHope that helps.";
        let outcome = parse_or_fallback(raw, Decision { needed: true }, "test");
        assert_eq!(outcome, Outcome::Parsed(Decision { needed: false }));
    }

    #[test]
    fn test_parse_garbage_falls_back() {
        let outcome = parse_or_fallback(
            "I cannot answer that question.",
            Decision { needed: true },
            "test",
        );
        assert_eq!(outcome, Outcome::FellBack(Decision { needed: true }));
        assert!(outcome.fell_back());
    }

    #[test]
    fn test_parse_truncated_json_falls_back() {
        let outcome = parse_or_fallback(r#"{"needed": tr"#, Decision { needed: true }, "test");
        assert!(outcome.fell_back());
    }

    #[test]
    fn test_parse_array() {
        let raw = r#"["first", "second", "third"]"#;
        let outcome = parse_or_fallback(raw, Vec::<String>::new(), "test");
        assert_eq!(
            outcome.into_inner(),
            vec!["first".to_string(), "second".to_string(), "third".to_string()]
        );
    }

    #[test]
    fn test_parse_fenced_array_with_prose() {
        let raw = "Here you go:\n```json\n[\"a\", \"b\"]\n```";
        let outcome = parse_or_fallback(raw, Vec::<String>::new(), "test");
        assert_eq!(outcome.into_inner(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_parse_array_of_objects() {
        let raw = r#"[{"needed": true}, {"needed": false}]"#;
        let outcome = parse_or_fallback(raw, Vec::<Decision>::new(), "test");
        assert_eq!(outcome.into_inner().len(), 2);
    }

    #[test]
    fn test_parse_object_containing_array() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Wrapper {
            items: Vec<String>,
        }
        let raw = r#"{"items": ["x", "y"]}"#;
        let outcome = parse_or_fallback(raw, Wrapper { items: vec![] }, "test");
        assert_eq!(outcome.into_inner().items, vec!["x", "y"]);
    }

    // ---- extract_json ----

    #[test]
    fn test_extract_json_passthrough() {
        assert_eq!(extract_json(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_json_no_delimiters() {
        assert_eq!(extract_json("no json here"), "no json here");
    }

    #[test]
    fn test_extract_json_trailing_prose_after_object() {
        assert_eq!(
            extract_json("prefix {\"a\": 1} suffix"),
            "{\"a\": 1}"
        );
    }

    // ---- Outcome ----

    #[test]
    fn test_outcome_into_inner_both_variants() {
        assert_eq!(Outcome::Parsed(7).into_inner(), 7);
        assert_eq!(Outcome::FellBack(9).into_inner(), 9);
    }
}
