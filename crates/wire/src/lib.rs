//! Wire-text bridge for Shapeshift
//!
//! The engine works purely on raw trees ([`Value`](shapeshift_core::Value)).
//! This crate converts those trees to and from JSON text. Values JSON cannot
//! represent natively use single-key wrapper objects:
//!
//! - `$bytes`: Base64 encoding for `Value::Bytes`
//! - `$f64`: Special float wrapper for NaN, ±Inf, -0.0
//!
//! ## Wire Encoding Rules
//!
//! | Value Shape | JSON Encoding |
//! |------------|--------------|
//! | Null | `null` |
//! | Bool | `true`/`false` |
//! | Int | number without fraction |
//! | Float (normal) | number with fraction or exponent |
//! | Float (special) | `{"$f64": "..."}` |
//! | String | `"..."` |
//! | Bytes | `{"$bytes": "..."}` |
//! | Array | `[...]` |
//! | Object | `{...}`, keys sorted |
//!
//! ## Examples
//!
//! ```
//! use shapeshift_wire::{encode_json, decode_json};
//! use shapeshift_core::Value;
//!
//! let value = Value::Int(42);
//! let json = encode_json(&value);
//! assert_eq!(json, "42");
//!
//! let decoded = decode_json("42").unwrap();
//! assert_eq!(decoded, Value::Int(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod json;

pub use json::{
    decode_json, encode_json, encode_json_pretty, from_json_value, to_json_value, DecodeError,
};
