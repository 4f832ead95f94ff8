//! JSON encoding for raw trees

use base64::Engine;
use serde_json::{Map, Number};
use shapeshift_core::Value;

/// Encode a raw tree as compact JSON text
pub fn encode_json(value: &Value) -> String {
    to_json_value(value).to_string()
}

/// Encode a raw tree as indented JSON text
pub fn encode_json_pretty(value: &Value) -> String {
    let json = to_json_value(value);
    // Serializing a serde_json::Value into a String cannot fail
    serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
}

/// Convert a raw tree to a `serde_json` value
///
/// Object keys come out sorted, so equal trees always produce equal text.
pub fn to_json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number(Number::from(*i)),
        Value::Float(f) => match value.special_float_kind() {
            Some(kind) => wrapper("$f64", kind.to_wire_string().to_string()),
            None => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        },
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => wrapper(
            "$bytes",
            base64::engine::general_purpose::STANDARD.encode(b),
        ),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json_value).collect()),
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::with_capacity(map.len());
            for key in keys {
                out.insert(key.clone(), to_json_value(&map[key]));
            }
            serde_json::Value::Object(out)
        }
    }
}

fn wrapper(key: &str, payload: String) -> serde_json::Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), serde_json::Value::String(payload));
    serde_json::Value::Object(map)
}
