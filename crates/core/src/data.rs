//! Decoded values
//!
//! [`Data`] is what a decode routine produces and what an encode routine
//! consumes. Unlike [`Value`] it has semantic scalars (dates, timestamps)
//! and [`Record`]s that remember which concrete record type they are.

use crate::types::RecordTypeId;
use crate::Value;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Decoded value
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// Absence of value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time without zone
    DateTime(NaiveDateTime),
    /// Ordered sequence
    List(Vec<Data>),
    /// String-keyed mapping, ordered by key
    Dict(BTreeMap<String, Data>),
    /// Instance of a record type
    Record(Record),
}

impl Data {
    /// Shape name (for error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            Data::Null => "null",
            Data::Bool(_) => "bool",
            Data::Int(_) => "int",
            Data::Float(_) => "float",
            Data::Str(_) => "str",
            Data::Bytes(_) => "bytes",
            Data::Date(_) => "date",
            Data::DateTime(_) => "datetime",
            Data::List(_) => "list",
            Data::Dict(_) => "dict",
            Data::Record(_) => "record",
        }
    }

    /// Build a dict from key/value pairs
    pub fn dict<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Data)>,
    {
        Data::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    /// Try to get as record
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Data::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Try to get as date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Data::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get as dict
    pub fn as_dict(&self) -> Option<&BTreeMap<String, Data>> {
        match self {
            Data::Dict(d) => Some(d),
            _ => None,
        }
    }
}

/// Untyped lift of a raw tree: objects become dicts, arrays become lists.
impl From<Value> for Data {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Data::Null,
            Value::Bool(b) => Data::Bool(b),
            Value::Int(i) => Data::Int(i),
            Value::Float(f) => Data::Float(f),
            Value::String(s) => Data::Str(s),
            Value::Bytes(b) => Data::Bytes(b),
            Value::Array(items) => Data::List(items.into_iter().map(Data::from).collect()),
            Value::Object(map) => {
                Data::Dict(map.into_iter().map(|(k, v)| (k, Data::from(v))).collect())
            }
        }
    }
}

/// Returned when lowering data that has no untyped raw form
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0} has no plain raw form")]
pub struct NotPlainData(pub &'static str);

/// Untyped lowering: dates and records need a strategy, so they are rejected.
impl TryFrom<&Data> for Value {
    type Error = NotPlainData;

    fn try_from(data: &Data) -> Result<Self, Self::Error> {
        Ok(match data {
            Data::Null => Value::Null,
            Data::Bool(b) => Value::Bool(*b),
            Data::Int(i) => Value::Int(*i),
            Data::Float(f) => Value::Float(*f),
            Data::Str(s) => Value::String(s.clone()),
            Data::Bytes(b) => Value::Bytes(b.clone()),
            Data::List(items) => Value::Array(
                items
                    .iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Data::Dict(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Value::try_from(v)?)))
                    .collect::<Result<_, NotPlainData>>()?,
            ),
            Data::Date(_) | Data::DateTime(_) | Data::Record(_) => {
                return Err(NotPlainData(data.type_name()))
            }
        })
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self {
        Data::Bool(b)
    }
}

impl From<i64> for Data {
    fn from(i: i64) -> Self {
        Data::Int(i)
    }
}

impl From<f64> for Data {
    fn from(f: f64) -> Self {
        Data::Float(f)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::Str(s.to_string())
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::Str(s)
    }
}

impl From<NaiveDate> for Data {
    fn from(d: NaiveDate) -> Self {
        Data::Date(d)
    }
}

impl From<NaiveDateTime> for Data {
    fn from(dt: NaiveDateTime) -> Self {
        Data::DateTime(dt)
    }
}

impl From<Record> for Data {
    fn from(r: Record) -> Self {
        Data::Record(r)
    }
}

/// Instance of a record type
///
/// Fields are kept in the record type's declaration order. Two records are
/// equal only if they are instances of the same concrete type with equal
/// field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: RecordTypeId,
    name: Arc<str>,
    fields: Vec<(String, Data)>,
}

impl Record {
    /// Assemble a record. Field order is taken as given.
    pub fn new(ty: RecordTypeId, name: Arc<str>, fields: Vec<(String, Data)>) -> Self {
        Self { ty, name, fields }
    }

    /// Concrete record type of this instance
    pub fn ty(&self) -> RecordTypeId {
        self.ty
    }

    /// Name of the concrete record type
    pub fn type_name(&self) -> &str {
        &self.name
    }

    /// Field value by name
    pub fn get(&self, name: &str) -> Option<&Data> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[(String, Data)] {
        &self.fields
    }

    /// Consume into fields
    pub fn into_fields(self) -> Vec<(String, Data)> {
        self.fields
    }
}
