pub mod movie;
pub mod price;
pub mod steam;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// External ids arrive as JSON numbers (Steam, TMDB) but are stored as text.
/// Accepts a number or a non-blank string; anything else is a schema error.
pub(crate) fn de_external_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unusable external id {other}"
        ))),
    }
}

/// Optional whole number that upstream may send as `80`, `80.0` or `null`.
/// Fractions round to the nearest integer; non-numbers are a schema error.
pub(crate) fn de_whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let n = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n,
        Some(other) => {
            return Err(serde::de::Error::custom(format!("expected a number, got {other}")))
        }
    };
    n.as_i64()
        .or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.round() as i64)
        })
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("number {n} out of range")))
}
