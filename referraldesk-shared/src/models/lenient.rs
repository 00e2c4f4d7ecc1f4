//! Deserializers for fields the API sends as either numbers or strings.
//!
//! The backend is inconsistent: ids arrive as `12` or `"12"`, amounts as
//! `150.5`, `"150.50"` or `null`. These helpers accept every observed shape.

use serde::{Deserialize, Deserializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Deserializes a required id from a number or a numeric string.
///
/// # Errors
/// Fails if the value is neither a non-negative integer nor a string holding one.
pub fn id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(value) => Ok(value),
        NumberOrString::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid id `{text}`"))),
        NumberOrString::Float(value) => Err(D::Error::custom(format!("invalid id `{value}`"))),
    }
}

/// Deserializes an optional id; blank strings and `null` become `None`.
///
/// # Errors
/// Fails if a non-blank value cannot be read as an id.
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Int(value)) => Ok(Some(value)),
        Some(NumberOrString::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid id `{text}`"))),
        Some(NumberOrString::Float(value)) => {
            Err(D::Error::custom(format!("invalid id `{value}`")))
        }
    }
}

/// Deserializes an amount; `null`, blanks and unparseable strings become `0.0`.
///
/// # Errors
/// Only fails on values that are not numbers, strings or `null`.
#[allow(clippy::cast_precision_loss)]
pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        None => 0.0,
        Some(NumberOrString::Int(value)) => value as f64,
        Some(NumberOrString::Float(value)) => value,
        Some(NumberOrString::Text(text)) => text.trim().parse().unwrap_or(0.0),
    })
}

/// Deserializes a count; `null` and unparseable strings become `0`.
///
/// # Errors
/// Only fails on values that are not numbers, strings or `null`.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        None | Some(NumberOrString::Float(_)) => 0,
        Some(NumberOrString::Int(value)) => value,
        Some(NumberOrString::Text(text)) => text.trim().parse().unwrap_or(0),
    })
}

/// Deserializes optional text that may arrive as a number (pincodes, mobiles).
///
/// # Errors
/// Only fails on values that are not numbers, strings or `null`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrString::Int(value)) => Some(value.to_string()),
        Some(NumberOrString::Float(value)) => Some(value.to_string()),
        Some(NumberOrString::Text(text)) => Some(text),
    })
}
