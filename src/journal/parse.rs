use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::entry::Entry;

const REQUIRED_FIELDS: [&str; 4] = ["id", "text", "date", "color"];

/// Parses the stored entries blob, dropping elements that are not complete
/// entries. Fails only when the blob itself is not a JSON array.
pub(super) fn parse_entries(raw: &str) -> Result<Vec<Entry>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid entries JSON")?;
    let items = parsed
        .as_array()
        .ok_or_else(|| anyhow!("stored entries are not a JSON array"))?;

    Ok(sanitize_values(items))
}

pub(super) fn sanitize_values(items: &[Value]) -> Vec<Entry> {
    items
        .iter()
        .filter(|item| has_required_fields(item))
        .filter_map(|item| Entry::deserialize(item).ok())
        .collect()
}

fn has_required_fields(item: &Value) -> bool {
    item.as_object()
        .is_some_and(|object| REQUIRED_FIELDS.iter().all(|field| object.contains_key(*field)))
}

/// Stored premium flags are JSON values; anything truthy counts.
pub(super) fn parse_premium(raw: &str) -> Result<bool> {
    let parsed: Value = serde_json::from_str(raw).context("invalid premium flag JSON")?;
    Ok(is_truthy(&parsed))
}

pub(super) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
