//! JSON wire encoding for raw trees
//!
//! Special wrappers are used for non-JSON-native values:
//!
//! - `{"$bytes": "<base64>"}` for binary data
//! - `{"$f64": "NaN|+Inf|-Inf|-0.0"}` for special floats

mod decode;
mod encode;

pub use decode::{decode_json, from_json_value, DecodeError};
pub use encode::{encode_json, encode_json_pretty, to_json_value};
