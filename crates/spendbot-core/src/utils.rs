use serde_json::Value;

/// Cut `s` to at most `max_len` characters, marking the cut with `...`.
pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len.saturating_sub(3)).collect::<String>();
    out.push_str("...");
    out
}

/// Plain-text rendering of a JSON scalar, as shown in a spreadsheet cell.
pub fn json_value_to_display(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
