//! Engine entry points
//!
//! [`Engine`] ties the registries and the codec cache together. Each call
//! takes one hierarchy snapshot up front and uses it throughout, so a type
//! defined concurrently is either fully visible to the call or not at all.

use crate::cache::CodecCache;
use crate::codec::{encode_nested, Ctx};
use crate::dialect::{resolve_effective, Dialect, DialectRegistry};
use crate::error::{CodecError, Result, ROOT};
use crate::options::EngineOptions;
use crate::schema::{RecordDef, RecordType};
use crate::subtype::{Hierarchy, SubtypeRegistry};
use shapeshift_core::{Data, Record, RecordTypeId, Value};
use std::sync::Arc;

/// Record codec engine
///
/// # Example
///
/// ```ignore
/// let engine = Engine::new();
/// let base = engine.define(
///     RecordDef::new("Variant1")
///         .field("x", SemType::Date)
///         .discriminator(DiscriminatorSpec::new("type").include_subtypes()),
/// )?;
/// let sub = engine.define(RecordDef::new("Variant1Subtype1").extends(base).tag("type", 1))?;
///
/// let record = engine.from_raw(base, &raw, None)?;
/// assert_eq!(record.ty(), sub);
/// ```
pub struct Engine {
    options: EngineOptions,
    subtypes: SubtypeRegistry,
    dialects: DialectRegistry,
    cache: CodecCache,
}

impl Engine {
    /// Create an engine with default options
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Create an engine with the given options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            cache: CodecCache::new(&options),
            options,
            subtypes: SubtypeRegistry::new(),
            dialects: DialectRegistry::new(),
        }
    }

    /// Options this engine was built with
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Named dialects
    pub fn dialects(&self) -> &DialectRegistry {
        &self.dialects
    }

    /// Record types and their hierarchy
    pub fn subtypes(&self) -> &SubtypeRegistry {
        &self.subtypes
    }

    /// Compiled codec cache
    pub fn cache(&self) -> &CodecCache {
        &self.cache
    }

    /// Define a record type
    ///
    /// A type that extends another is registered under every discriminated
    /// ancestor right away. Fails without publishing anything if the new
    /// type's tag collides with a type already known to one of its dispatch
    /// sites.
    pub fn define(&self, def: RecordDef) -> Result<RecordTypeId> {
        self.subtypes.define(def).map(|ty| ty.id())
    }

    /// Record type by id
    pub fn record_type(&self, id: RecordTypeId) -> Option<Arc<RecordType>> {
        self.subtypes.get(id)
    }

    /// Record type by name
    pub fn lookup(&self, name: &str) -> Option<Arc<RecordType>> {
        self.subtypes.lookup(name)
    }

    /// Build a record of type `id`, filling omitted fields from their defaults
    pub fn instantiate<K, I>(&self, id: RecordTypeId, fields: I) -> Result<Record>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Data)>,
    {
        let ty = self
            .record_type(id)
            .ok_or_else(|| CodecError::UnknownRecordType(id.to_string()))?;
        let mut provided: Vec<(String, Data)> =
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut out = Vec::with_capacity(ty.fields().len());
        for field in ty.fields() {
            let value = match provided.iter().position(|(name, _)| name == field.name()) {
                Some(pos) => provided.swap_remove(pos).1,
                None => field
                    .default()
                    .cloned()
                    .ok_or_else(|| CodecError::MissingField {
                        path: ROOT.to_string(),
                        field: field.name().to_string(),
                    })?,
            };
            out.push((field.name().to_string(), value));
        }
        if let Some((name, _)) = provided.first() {
            return Err(CodecError::UnexpectedField {
                path: ROOT.to_string(),
                field: name.clone(),
            });
        }
        Ok(Record::new(ty.id(), Arc::clone(ty.shared_name()), out))
    }

    /// Decode a raw tree as record type `id`
    ///
    /// A self-discriminated `id` dispatches on its tag, so the result may be
    /// any registered concrete descendant.
    pub fn from_raw(
        &self,
        id: RecordTypeId,
        raw: &Value,
        dialect: Option<&Arc<Dialect>>,
    ) -> Result<Record> {
        let hierarchy = self.subtypes.snapshot();
        let ty = Self::type_in(&hierarchy, id)?;
        let effective = resolve_effective(ty, dialect)?;
        let compiled = self.cache.get_or_build(&hierarchy, ty, effective)?;
        let ctx = self.root_ctx(&hierarchy, compiled.dialect());
        compiled.decode(raw, &ctx)
    }

    /// Encode a record with its own type's codec
    pub fn to_raw(&self, record: &Record, dialect: Option<&Arc<Dialect>>) -> Result<Value> {
        let hierarchy = self.subtypes.snapshot();
        let ty = Self::type_in(&hierarchy, record.ty())?;
        let effective = resolve_effective(ty, dialect)?;
        let compiled = self.cache.get_or_build(&hierarchy, ty, effective)?;
        let ctx = self.root_ctx(&hierarchy, compiled.dialect());
        compiled.encode_fields(record, &ctx)
    }

    /// Encode a record where a value of type `base` is expected
    ///
    /// The record must be `base` or one of its descendants; if `base` is
    /// self-discriminated it must also be one of the tagged variants.
    /// Dialect support is checked against `base`.
    pub fn to_raw_as(
        &self,
        base: RecordTypeId,
        record: &Record,
        dialect: Option<&Arc<Dialect>>,
    ) -> Result<Value> {
        let hierarchy = self.subtypes.snapshot();
        let base_ty = Self::type_in(&hierarchy, base)?;
        let effective = resolve_effective(base_ty, dialect)?;
        let compiled = self.cache.get_or_build(&hierarchy, base_ty, effective)?;
        let ctx = self.root_ctx(&hierarchy, compiled.dialect());
        match compiled.dispatch() {
            Some(plan) => plan.encode(record, &ctx),
            None => encode_nested(base, record, &ctx),
        }
    }

    fn type_in(hierarchy: &Hierarchy, id: RecordTypeId) -> Result<&Arc<RecordType>> {
        hierarchy
            .get(id)
            .ok_or_else(|| CodecError::UnknownRecordType(id.to_string()))
    }

    fn root_ctx<'a>(
        &'a self,
        hierarchy: &'a Hierarchy,
        dialect: Option<&'a Arc<Dialect>>,
    ) -> Ctx<'a> {
        Ctx {
            cache: &self.cache,
            hierarchy,
            dialect,
            depth: 0,
            max_depth: self.options.max_depth,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
