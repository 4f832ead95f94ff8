//! Builtin routines for scalar type keys
//!
//! | key | decode accepts | encode emits |
//! |-----|----------------|--------------|
//! | bool | Bool | Bool |
//! | int | Int | Int |
//! | float | Float or Int | Float |
//! | str | String | String |
//! | bytes | Bytes | Bytes |
//! | date | `YYYY-MM-DD` string | `YYYY-MM-DD` string |
//! | datetime | `YYYY-MM-DDTHH:MM:SS[.f]` string | same |
//!
//! Containers are structural and live in the codec tree, not here.

use crate::error::{CodecError, Result};
use crate::strategy::TypeKey;
use chrono::{NaiveDate, NaiveDateTime};
use shapeshift_core::{Data, Value};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Whether `key` is handled by [`decode`] / [`encode`]
pub fn is_scalar(key: &TypeKey) -> bool {
    matches!(
        key,
        TypeKey::Bool
            | TypeKey::Int
            | TypeKey::Float
            | TypeKey::Str
            | TypeKey::Bytes
            | TypeKey::Date
            | TypeKey::DateTime
    )
}

/// Decode a raw scalar with the builtin routine for `key`
pub fn decode(key: &TypeKey, raw: &Value) -> Result<Data> {
    let mismatch = || CodecError::invalid(key.to_string(), raw.type_name());
    match (key, raw) {
        (TypeKey::Bool, Value::Bool(b)) => Ok(Data::Bool(*b)),
        (TypeKey::Int, Value::Int(i)) => Ok(Data::Int(*i)),
        (TypeKey::Float, Value::Float(f)) => Ok(Data::Float(*f)),
        (TypeKey::Float, Value::Int(i)) => Ok(Data::Float(*i as f64)),
        (TypeKey::Str, Value::String(s)) => Ok(Data::Str(s.clone())),
        (TypeKey::Bytes, Value::Bytes(b)) => Ok(Data::Bytes(b.clone())),
        (TypeKey::Date, Value::String(s)) => s
            .parse::<NaiveDate>()
            .map(Data::Date)
            .map_err(|_| CodecError::invalid("ISO date", format!("{:?}", s))),
        (TypeKey::DateTime, Value::String(s)) => s
            .parse::<NaiveDateTime>()
            .map(Data::DateTime)
            .map_err(|_| CodecError::invalid("ISO datetime", format!("{:?}", s))),
        _ => Err(mismatch()),
    }
}

/// Encode a decoded scalar with the builtin routine for `key`
pub fn encode(key: &TypeKey, data: &Data) -> Result<Value> {
    let mismatch = || CodecError::invalid(key.to_string(), data.type_name());
    match (key, data) {
        (TypeKey::Bool, Data::Bool(b)) => Ok(Value::Bool(*b)),
        (TypeKey::Int, Data::Int(i)) => Ok(Value::Int(*i)),
        (TypeKey::Float, Data::Float(f)) => Ok(Value::Float(*f)),
        (TypeKey::Float, Data::Int(i)) => Ok(Value::Float(*i as f64)),
        (TypeKey::Str, Data::Str(s)) => Ok(Value::String(s.clone())),
        (TypeKey::Bytes, Data::Bytes(b)) => Ok(Value::Bytes(b.clone())),
        (TypeKey::Date, Data::Date(d)) => Ok(Value::String(d.to_string())),
        (TypeKey::DateTime, Data::DateTime(dt)) => {
            Ok(Value::String(dt.format(DATETIME_FORMAT).to_string()))
        }
        _ => Err(mismatch()),
    }
}
