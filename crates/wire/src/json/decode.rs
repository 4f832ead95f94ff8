//! JSON decoding to raw trees
//!
//! Parses JSON text with `serde_json` and maps the result onto [`Value`],
//! unwrapping the special wrappers:
//! - `$bytes` for binary data (base64)
//! - `$f64` for special floats (NaN, ±Inf, -0.0)

use base64::Engine;
use shapeshift_core::{SpecialFloatKind, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Decode error types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    /// Invalid JSON syntax
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Number that is neither an i64 nor a finite f64
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// Invalid base64 in $bytes wrapper
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    /// Invalid value in $f64 wrapper
    #[error("Invalid $f64 value: {0}")]
    InvalidF64Wrapper(String),

    /// Unexpected end of input
    #[error("Unexpected end of input")]
    UnexpectedEnd,
}

/// Decode a JSON string to a raw tree
pub fn decode_json(json: &str) -> Result<Value, DecodeError> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::UnexpectedEnd);
    }

    let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
        if e.is_eof() {
            DecodeError::UnexpectedEnd
        } else {
            DecodeError::InvalidJson(e.to_string())
        }
    })?;
    from_json_value(parsed)
}

/// Convert an already-parsed `serde_json` value to a raw tree
pub fn from_json_value(json: serde_json::Value) -> Result<Value, DecodeError> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                // Also covers u64 values above i64::MAX
                Value::Float(f)
            } else {
                return Err(DecodeError::InvalidNumber(n.to_string()));
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_json_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        serde_json::Value::Object(map) => decode_object_or_wrapper(map)?,
    })
}

fn decode_object_or_wrapper(
    map: serde_json::Map<String, serde_json::Value>,
) -> Result<Value, DecodeError> {
    // Wrappers are single-key objects with a string payload
    if map.len() == 1 {
        if let Some(serde_json::Value::String(b64)) = map.get("$bytes") {
            return decode_bytes_wrapper(b64);
        }
        if let Some(serde_json::Value::String(f64_str)) = map.get("$f64") {
            return decode_f64_wrapper(f64_str);
        }
    }

    let mut object = HashMap::with_capacity(map.len());
    for (key, value) in map {
        object.insert(key, from_json_value(value)?);
    }
    Ok(Value::Object(object))
}

/// Decode $bytes wrapper (base64)
fn decode_bytes_wrapper(b64: &str) -> Result<Value, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
    Ok(Value::Bytes(bytes))
}

/// Decode $f64 wrapper (special floats)
fn decode_f64_wrapper(value: &str) -> Result<Value, DecodeError> {
    SpecialFloatKind::from_wire_string(value)
        .map(|kind| Value::Float(kind.to_f64()))
        .ok_or_else(|| DecodeError::InvalidF64Wrapper(value.to_string()))
}
