use serde_json::Value;

/// Pull the display text out of a streamed LLM payload.
///
/// Recognised shapes, in order: a bare string, `{"content": ..}`,
/// `{"choices": [{"delta": {"content": ..}}]}` and `{"delta": {"content": ..}}`.
/// Empty strings count as absent.
pub fn extract_token(value: &Value) -> Option<&str> {
    if let Some(s) = value.as_str() {
        return Some(s);
    }

    [
        value.get("content"),
        value.pointer("/choices/0/delta/content"),
        value.pointer("/delta/content"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|s| !s.is_empty())
}
