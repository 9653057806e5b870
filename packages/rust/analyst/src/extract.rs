//! Pull a JSON object out of a model reply.

use std::sync::LazyLock;

use regex::Regex;

/// Locate the JSON object in a completion.
///
/// Models often wrap JSON in a fenced code block or add a sentence before it.
/// Returns the fenced body if there is one, otherwise the span from the first
/// `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<&str> {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("valid regex")
    });

    if let Some(caps) = FENCE_RE.captures(text) {
        return caps.get(1).map(|m| m.as_str());
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
