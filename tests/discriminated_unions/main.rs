//! Discriminated Union Test Suite
//!
//! End-to-end tests for dialect-scoped strategies and discriminator-based
//! subtype dispatch through the `Shapeshift` facade.
//!
//! ## Modules
//!
//! - `dialects`: dialect precedence and propagation into dispatched values
//! - `dispatch`: tag resolution, failures and late subtype registration
//! - `roundtrip`: property tests for encode/decode under each dialect
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test discriminated_unions
//!
//! # Dialect tests only
//! cargo test --test discriminated_unions dialects::
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use shapeshift::prelude::*;

// Test modules
pub mod dialects;
pub mod roundtrip;

type StrategyResult<T> = std::result::Result<T, StrategyError>;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Route engine logs to the test harness; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// 2023-06-03, the date every fixture carries
pub fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 3).expect("valid date")
}

/// `{"1": 2, "3": 4}`
pub fn sample_dict() -> Data {
    Data::dict([("1", Data::Int(2)), ("3", Data::Int(4))])
}

/// Input shaped for `DefaultDialect`: ISO date, dict as list of pairs
pub fn iso_raw(tag: i64) -> Value {
    Value::object([
        ("type", Value::Int(tag)),
        ("x", Value::from("2023-06-03")),
        (
            "y",
            Value::Array(vec![
                Value::Array(vec![Value::from("1"), Value::Int(2)]),
                Value::Array(vec![Value::from("3"), Value::Int(4)]),
            ]),
        ),
    ])
}

/// Input shaped for `MyDialect`: ordinal date, dict as mapping
pub fn ordinal_raw(tag: i64) -> Value {
    Value::object([
        ("type", Value::Int(tag)),
        ("x", Value::Int(738674)),
        (
            "y",
            Value::object([("1", Value::Int(2)), ("3", Value::Int(4))]),
        ),
    ])
}

pub fn iso_json(tag: i64) -> String {
    format!(
        r#"{{"type": {}, "x": "2023-06-03", "y": [["1", 2], ["3", 4]]}}"#,
        tag
    )
}

pub fn ordinal_json(tag: i64) -> String {
    format!(r#"{{"type": {}, "x": 738674, "y": {{"1": 2, "3": 4}}}}"#, tag)
}

/// Wrap a payload under key `x`
pub fn wrap_raw(inner: Value) -> Value {
    Value::object([("x", inner)])
}

pub fn wrap_json(inner: &str) -> String {
    format!(r#"{{"x": {}}}"#, inner)
}

// =============================================================================
// DIALECTS
// =============================================================================

fn iso_date_decode(raw: &Value) -> StrategyResult<Data> {
    let text = raw
        .as_str()
        .ok_or_else(|| StrategyError::new(format!("expected ISO date, got {}", raw.type_name())))?;
    text.parse::<NaiveDate>()
        .map(Data::Date)
        .map_err(|e| StrategyError::new(e.to_string()))
}

fn iso_date_encode(data: &Data) -> StrategyResult<Value> {
    data.as_date()
        .map(|d| Value::from(d.to_string()))
        .ok_or_else(|| StrategyError::new("expected date"))
}

fn ordinal_date_decode(raw: &Value) -> StrategyResult<Data> {
    let ordinal = raw
        .as_int()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| StrategyError::new(format!("expected ordinal, got {}", raw.type_name())))?;
    NaiveDate::from_num_days_from_ce_opt(ordinal)
        .map(Data::Date)
        .ok_or_else(|| StrategyError::new(format!("ordinal {} out of range", ordinal)))
}

fn ordinal_date_encode(data: &Data) -> StrategyResult<Value> {
    data.as_date()
        .map(|d| Value::Int(i64::from(d.num_days_from_ce())))
        .ok_or_else(|| StrategyError::new("expected date"))
}

fn pairs_decode(raw: &Value) -> StrategyResult<Data> {
    let items = raw
        .as_array()
        .ok_or_else(|| StrategyError::new(format!("expected pairs, got {}", raw.type_name())))?;
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        match item.as_array() {
            Some([key, value]) => {
                let key = key
                    .as_str()
                    .ok_or_else(|| StrategyError::new("pair key must be a string"))?;
                entries.push((key.to_string(), Data::from(value.clone())));
            }
            _ => return Err(StrategyError::new("expected a [key, value] pair")),
        }
    }
    Ok(Data::dict(entries))
}

fn pairs_encode(data: &Data) -> StrategyResult<Value> {
    let map = data
        .as_dict()
        .ok_or_else(|| StrategyError::new("expected dict"))?;
    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        let value = Value::try_from(value).map_err(|e| StrategyError::new(e.to_string()))?;
        pairs.push(Value::Array(vec![Value::from(key.as_str()), value]));
    }
    Ok(Value::Array(pairs))
}

fn mapping_decode(raw: &Value) -> StrategyResult<Data> {
    let map = raw
        .as_object()
        .ok_or_else(|| StrategyError::new(format!("expected mapping, got {}", raw.type_name())))?;
    Ok(Data::dict(
        map.iter().map(|(k, v)| (k.clone(), Data::from(v.clone()))),
    ))
}

fn mapping_encode(data: &Data) -> StrategyResult<Value> {
    let map = data
        .as_dict()
        .ok_or_else(|| StrategyError::new("expected dict"))?;
    let mut out = HashMap::with_capacity(map.len());
    for (key, value) in map {
        let value = Value::try_from(value).map_err(|e| StrategyError::new(e.to_string()))?;
        out.insert(key.clone(), value);
    }
    Ok(Value::Object(out))
}

/// ISO dates, dicts as lists of pairs
pub fn default_dialect() -> Arc<Dialect> {
    Dialect::builder("DefaultDialect")
        .strategy(TypeKey::Date, Strategy::pair(iso_date_decode, iso_date_encode))
        .strategy(TypeKey::Dict, Strategy::pair(pairs_decode, pairs_encode))
        .build()
}

/// Ordinal dates, dicts passed through as mappings
pub fn my_dialect() -> Arc<Dialect> {
    Dialect::builder("MyDialect")
        .strategy(
            TypeKey::Date,
            Strategy::pair(ordinal_date_decode, ordinal_date_encode),
        )
        .strategy(TypeKey::Dict, Strategy::pair(mapping_decode, mapping_encode))
        .build()
}

// =============================================================================
// MODEL
// =============================================================================

/// The record types every dialect test runs against
pub struct Model {
    pub codec: Shapeshift,
    pub default_dialect: Arc<Dialect>,
    pub my_dialect: Arc<Dialect>,

    /// Self-discriminated on `type`, default dialect, call-site dialects allowed
    pub variant1: RecordTypeId,
    pub variant1_subtype1: RecordTypeId,

    /// Plain base; discriminated through `Variant2Wrapper.x`
    pub variant2: RecordTypeId,
    pub variant2_subtype1: RecordTypeId,
    pub variant2_wrapper: RecordTypeId,

    /// Union members discriminated through `Variant34Wrapper.x`
    pub variant3: RecordTypeId,
    pub variant3_subtype: RecordTypeId,
    pub variant4: RecordTypeId,
    pub variant4_subtype: RecordTypeId,
    pub variant34_wrapper: RecordTypeId,
}

fn payload_base(name: &str, dialect: &Arc<Dialect>) -> RecordDef {
    RecordDef::new(name)
        .field("x", SemType::Date)
        .field("y", SemType::dict(SemType::Int))
        .dialect(Arc::clone(dialect))
        .allow_call_site_dialect()
}

fn by_type() -> DiscriminatorSpec {
    DiscriminatorSpec::new("type").include_subtypes()
}

impl Model {
    /// Build the model on a fresh codec
    pub fn new() -> Self {
        Self::on(Shapeshift::new())
    }

    /// Build the model on the given codec
    pub fn on(codec: Shapeshift) -> Self {
        init_tracing();
        let default_dialect = default_dialect();
        let my_dialect = my_dialect();

        let variant1 = codec
            .define(payload_base("Variant1", &default_dialect).discriminator(by_type()))
            .unwrap();
        let variant1_subtype1 = codec
            .define(RecordDef::new("Variant1Subtype1").extends(variant1).tag("type", 1))
            .unwrap();

        let variant2 = codec
            .define(payload_base("Variant2", &default_dialect))
            .unwrap();
        let variant2_subtype1 = codec
            .define(RecordDef::new("Variant2Subtype1").extends(variant2).tag("type", 1))
            .unwrap();
        let variant2_wrapper = codec
            .define(
                RecordDef::new("Variant2Wrapper")
                    .discriminated_field("x", SemType::Record(variant2), by_type())
                    .allow_call_site_dialect(),
            )
            .unwrap();

        let variant3 = codec
            .define(payload_base("Variant3", &default_dialect))
            .unwrap();
        let variant3_subtype = codec
            .define(RecordDef::new("Variant3Subtype").extends(variant3).tag("type", 3))
            .unwrap();
        let variant4 = codec
            .define(payload_base("Variant4", &default_dialect))
            .unwrap();
        let variant4_subtype = codec
            .define(RecordDef::new("Variant4Subtype").extends(variant4).tag("type", 4))
            .unwrap();
        let variant34_wrapper = codec
            .define(
                RecordDef::new("Variant34Wrapper")
                    .discriminated_field("x", SemType::union_of([variant3, variant4]), by_type())
                    .allow_call_site_dialect(),
            )
            .unwrap();

        Self {
            codec,
            default_dialect,
            my_dialect,
            variant1,
            variant1_subtype1,
            variant2,
            variant2_subtype1,
            variant2_wrapper,
            variant3,
            variant3_subtype,
            variant4,
            variant4_subtype,
            variant34_wrapper,
        }
    }

    /// Define a tagged subtype of `base` after the model is in use
    pub fn add_subtype(&self, name: &str, base: RecordTypeId, tag: i64) -> RecordTypeId {
        self.codec
            .define(RecordDef::new(name).extends(base).tag("type", tag))
            .unwrap()
    }

    /// Expected decoded payload of type `ty`
    pub fn payload(&self, ty: RecordTypeId) -> Record {
        self.codec
            .instantiate(
                ty,
                [("x", Data::Date(sample_date())), ("y", sample_dict())],
            )
            .unwrap()
    }

    /// Expected decoded wrapper holding `inner`
    pub fn wrapped(&self, wrapper: RecordTypeId, inner: Record) -> Record {
        self.codec
            .instantiate(wrapper, [("x", Data::Record(inner))])
            .unwrap()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
