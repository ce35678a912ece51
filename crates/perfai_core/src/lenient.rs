//! `deserialize_with` helpers for backend fields whose type drifts.
//!
//! Each helper reads the field as a [`Value`] first and maps anything it cannot
//! interpret to `None` (or the type's default), so one odd field never fails
//! the whole response.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Any `T`, or `None` when the value is null or has the wrong shape.
pub(crate) fn value<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(de)?;
    if raw.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(raw).ok())
}

/// A list of `T`, skipping entries that do not decode. Non-arrays become `None`.
pub(crate) fn list<'de, D, T>(de: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Numbers, or strings with a numeric prefix such as `"120ms"`.
pub(crate) fn number<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_number(&Value::deserialize(de)?))
}

/// Non-negative counts; fractional values are rounded.
pub(crate) fn count<'de, D>(de: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_number(&Value::deserialize(de)?)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round() as u64))
}

/// Strings, with numbers and booleans rendered as text.
pub(crate) fn text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_text(Value::deserialize(de)?))
}

pub(crate) fn text_or_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_text(Value::deserialize(de)?).unwrap_or_default())
}

pub(crate) fn flag<'de, D>(de: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::Bool(flag) => Some(flag),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Text values parsed through `T::from(String)`.
pub(crate) fn from_text<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    Ok(as_text(Value::deserialize(de)?).map(T::from))
}

pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => leading_number(text),
        _ => None,
    }
}

pub(crate) fn as_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_accept_units_and_reject_garbage() {
        assert_eq!(as_number(&json!(3)), Some(3.0));
        assert_eq!(as_number(&json!("120ms")), Some(120.0));
        assert_eq!(as_number(&json!("-1.5 s")), Some(-1.5));
        assert_eq!(as_number(&json!("fast")), None);
        assert_eq!(as_number(&json!([1])), None);
    }

    #[test]
    fn text_renders_scalars() {
        assert_eq!(as_text(json!(7)), Some("7".to_string()));
        assert_eq!(as_text(json!(true)), Some("true".to_string()));
        assert_eq!(as_text(json!(null)), None);
        assert_eq!(as_text(json!({ "a": 1 })), None);
    }
}
