//! Lenient scalar decoding.
//!
//! The manager is not consistent about numbers: ports and codes arrive as
//! JSON numbers, as numeric strings, as empty strings or as `null`. Text
//! fields may likewise be `null` or a bare number.

use serde::de::{Deserializer, Error};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Int(i64),
    Text(String),
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Lenient>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Lenient::Int(n)) => Ok(Some(n)),
        Some(Lenient::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse().map(Some).map_err(D::Error::custom)
            }
        }
    }
}

/// Optional port; absent, `null` and `""` all decode to `None`.
pub fn opt_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_i64(deserializer)?
        .map(|n| u16::try_from(n).map_err(|_| D::Error::custom(format!("invalid port: {n}"))))
        .transpose()
}

/// Response code; a missing code decodes to `0`, which is never success.
pub fn code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_i64(deserializer)?.unwrap_or_default())
}

/// Optional count or port as `u32`, `0` when absent.
pub fn number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_i64(deserializer)?
        .map_or(Ok(0), |n| {
            u32::try_from(n).map_err(|_| D::Error::custom(format!("invalid number: {n}")))
        })
}

/// Optional text; numbers and booleans are rendered, `null` and nested
/// values decode to `None`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Text that is empty when absent or `null`.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_text(deserializer)?.unwrap_or_default())
}
