mod account;
mod course;
mod project;

pub use account::*;
pub use course::*;
pub use project::*;

/// Decode a JSON-array TEXT column into a list of strings. Bad or legacy
/// values decode to an empty list rather than failing the whole row.
pub(crate) fn decode_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Encode a list of strings into the JSON-array TEXT column format.
pub(crate) fn encode_string_list(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string())
}
