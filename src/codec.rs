//! Main entry point for Shapeshift.
//!
//! This module provides the `Shapeshift` struct, the handle all record
//! definitions and conversions go through.

use crate::error::Result;
use shapeshift_core::{Data, Record, RecordTypeId, Value};
use shapeshift_engine::{Dialect, Engine, EngineOptions, RecordDef, RecordType};
use std::sync::Arc;
use tracing::debug;

/// The Shapeshift codec.
///
/// Cheap to clone; clones share the same record types, dialects and codec
/// cache.
///
/// # Example
///
/// ```ignore
/// use shapeshift::prelude::*;
///
/// let codec = Shapeshift::new();
/// let base = codec.define(
///     RecordDef::new("Variant1")
///         .field("x", SemType::Date)
///         .discriminator(DiscriminatorSpec::new("type").include_subtypes()),
/// )?;
/// codec.define(RecordDef::new("Variant1Subtype1").extends(base).tag("type", 1))?;
///
/// let record = codec.from_json(base, r#"{"x": "2023-06-03", "type": 1}"#, None)?;
/// let text = codec.to_json(&record, None)?;
/// ```
#[derive(Clone)]
pub struct Shapeshift {
    inner: Arc<Engine>,
}

impl Shapeshift {
    /// Create a codec with default options.
    pub fn new() -> Self {
        Self::from_engine(Engine::new())
    }

    /// Create a builder for codec configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let codec = Shapeshift::builder()
    ///     .max_depth(16)
    ///     .forbid_extra_keys()
    ///     .build()?;
    /// ```
    pub fn builder() -> ShapeshiftBuilder {
        ShapeshiftBuilder::new()
    }

    /// Underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.inner
    }

    /// Define a record type.
    pub fn define(&self, def: RecordDef) -> Result<RecordTypeId> {
        self.inner.define(def).map_err(Into::into)
    }

    /// Look up a record type by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<RecordType>> {
        self.inner.lookup(name)
    }

    /// Record type by id.
    pub fn record_type(&self, id: RecordTypeId) -> Option<Arc<RecordType>> {
        self.inner.record_type(id)
    }

    /// Build a record of type `id`, filling omitted fields from their defaults.
    pub fn instantiate<K, I>(&self, id: RecordTypeId, fields: I) -> Result<Record>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Data)>,
    {
        self.inner.instantiate(id, fields).map_err(Into::into)
    }

    /// Register a named dialect.
    pub fn register_dialect(&self, dialect: Arc<Dialect>) -> Result<()> {
        self.inner.dialects().register(dialect).map_err(Into::into)
    }

    /// Named dialect, if registered.
    pub fn dialect(&self, name: &str) -> Option<Arc<Dialect>> {
        self.inner.dialects().get(name)
    }

    /// Decode a raw tree as record type `id`.
    pub fn from_raw(
        &self,
        id: RecordTypeId,
        raw: &Value,
        dialect: Option<&Arc<Dialect>>,
    ) -> Result<Record> {
        self.inner.from_raw(id, raw, dialect).map_err(Into::into)
    }

    /// Encode a record with its own type's codec.
    pub fn to_raw(&self, record: &Record, dialect: Option<&Arc<Dialect>>) -> Result<Value> {
        self.inner.to_raw(record, dialect).map_err(Into::into)
    }

    /// Encode a record where a value of type `base` is expected.
    pub fn to_raw_as(
        &self,
        base: RecordTypeId,
        record: &Record,
        dialect: Option<&Arc<Dialect>>,
    ) -> Result<Value> {
        self.inner.to_raw_as(base, record, dialect).map_err(Into::into)
    }

    /// Parse JSON text and decode it as record type `id`.
    pub fn from_json(
        &self,
        id: RecordTypeId,
        text: &str,
        dialect: Option<&Arc<Dialect>>,
    ) -> Result<Record> {
        let raw = shapeshift_wire::decode_json(text)?;
        self.from_raw(id, &raw, dialect)
    }

    /// Encode a record to compact JSON text.
    pub fn to_json(&self, record: &Record, dialect: Option<&Arc<Dialect>>) -> Result<String> {
        let raw = self.to_raw(record, dialect)?;
        Ok(shapeshift_wire::encode_json(&raw))
    }

    /// Encode a record to indented JSON text.
    pub fn to_json_pretty(
        &self,
        record: &Record,
        dialect: Option<&Arc<Dialect>>,
    ) -> Result<String> {
        let raw = self.to_raw(record, dialect)?;
        Ok(shapeshift_wire::encode_json_pretty(&raw))
    }

    fn from_engine(engine: Engine) -> Self {
        Self {
            inner: Arc::new(engine),
        }
    }
}

impl Default for Shapeshift {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for codec configuration.
///
/// # Example
///
/// ```ignore
/// // Defaults: cached codecs, depth 128, extra keys ignored
/// let codec = Shapeshift::builder().build()?;
///
/// // Reject unknown input keys everywhere
/// let codec = Shapeshift::builder().strict().build()?;
///
/// // From a config file
/// let codec = Shapeshift::builder().with_toml(&text)?.build()?;
/// ```
pub struct ShapeshiftBuilder {
    options: EngineOptions,
}

impl ShapeshiftBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            options: EngineOptions::default(),
        }
    }

    /// Replace all options.
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Load options from TOML text, replacing the current ones.
    pub fn with_toml(mut self, text: &str) -> Result<Self> {
        self.options = EngineOptions::from_toml_str(text)?;
        Ok(self)
    }

    /// Use the strict preset.
    pub fn strict(self) -> Self {
        self.options(EngineOptions::strict())
    }

    /// Use the permissive preset.
    pub fn permissive(self) -> Self {
        self.options(EngineOptions::permissive())
    }

    /// Maximum record nesting per call.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = depth;
        self
    }

    /// Compile codecs on every call instead of caching them.
    pub fn no_cache(mut self) -> Self {
        self.options.cache_codecs = false;
        self
    }

    /// Reject unknown input keys for record types without their own policy.
    pub fn forbid_extra_keys(mut self) -> Self {
        self.options.forbid_extra_keys = true;
        self
    }

    /// Build the codec.
    pub fn build(self) -> Result<Shapeshift> {
        self.options.validate()?;
        debug!(
            cache_codecs = self.options.cache_codecs,
            max_depth = self.options.max_depth,
            forbid_extra_keys = self.options.forbid_extra_keys,
            "building codec"
        );
        Ok(Shapeshift::from_engine(Engine::with_options(self.options)))
    }
}

impl Default for ShapeshiftBuilder {
    fn default() -> Self {
        Self::new()
    }
}
