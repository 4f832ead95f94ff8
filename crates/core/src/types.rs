//! Identity types shared by the engine and the value model
//!
//! - [`RecordTypeId`]: arena index of a defined record type
//! - [`Tag`]: literal discriminant value

use crate::{Data, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a defined record type
///
/// Ids are dense indexes into the engine's type arena, assigned in
/// definition order. They are only meaningful for the engine that issued
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordTypeId(u32);

impl RecordTypeId {
    /// Create an id from an arena index, `None` past `u32::MAX`
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(RecordTypeId)
    }

    /// Arena index of this id
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RecordTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Literal discriminant value
///
/// Tags are compared in their literal scalar form, never through a
/// strategy: `Int(1)` and `Str("1")` are different tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    /// Integer tag
    Int(i64),
    /// String tag
    Str(String),
    /// Boolean tag
    Bool(bool),
}

impl Tag {
    /// Read a tag from a raw scalar, `None` for non-scalar shapes
    pub fn from_value(value: &Value) -> Option<Tag> {
        match value {
            Value::Int(i) => Some(Tag::Int(*i)),
            Value::String(s) => Some(Tag::Str(s.clone())),
            Value::Bool(b) => Some(Tag::Bool(*b)),
            _ => None,
        }
    }

    /// Read a tag from a decoded scalar (a field default)
    pub fn from_data(data: &Data) -> Option<Tag> {
        match data {
            Data::Int(i) => Some(Tag::Int(*i)),
            Data::Str(s) => Some(Tag::Str(s.clone())),
            Data::Bool(b) => Some(Tag::Bool(*b)),
            _ => None,
        }
    }

    /// Raw form of this tag
    pub fn to_value(&self) -> Value {
        match self {
            Tag::Int(i) => Value::Int(*i),
            Tag::Str(s) => Value::String(s.clone()),
            Tag::Bool(b) => Value::Bool(*b),
        }
    }

    /// Decoded form of this tag
    pub fn to_data(&self) -> Data {
        match self {
            Tag::Int(i) => Data::Int(*i),
            Tag::Str(s) => Data::Str(s.clone()),
            Tag::Bool(b) => Data::Bool(*b),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Int(i) => write!(f, "{}", i),
            Tag::Str(s) => write!(f, "{:?}", s),
            Tag::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Tag {
    fn from(i: i64) -> Self {
        Tag::Int(i)
    }
}

impl From<i32> for Tag {
    fn from(i: i32) -> Self {
        Tag::Int(i64::from(i))
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Tag::Str(s.to_string())
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Tag::Str(s)
    }
}

impl From<bool> for Tag {
    fn from(b: bool) -> Self {
        Tag::Bool(b)
    }
}
