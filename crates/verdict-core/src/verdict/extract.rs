//! Pull the JSON payload out of an LLM completion.
//!
//! Models are told to answer with bare JSON but often wrap it in a Markdown
//! code fence or add a sentence around it.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// ```json ... ``` or ``` ... ``` around a JSON object
    static ref FENCED_JSON: Regex = Regex::new(
        r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```"
    ).unwrap();
}

/// Return the JSON object embedded in `text`, if any.
///
/// A fenced block wins. Otherwise the first `{` that starts a complete JSON
/// object; failing that, the span from the first `{` to the last `}` so the
/// parser can report what is wrong with it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(captures) = FENCED_JSON.captures(text) {
        return captures.get(1).map(|m| m.as_str());
    }

    if let Some(object) = first_complete_object(text) {
        return Some(object);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn first_complete_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let rest = &text[start..];
        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<serde_json::Value>();
        match stream.next() {
            Some(Ok(serde_json::Value::Object(_))) => Some(&rest[..stream.byte_offset()]),
            _ => None,
        }
    })
}
