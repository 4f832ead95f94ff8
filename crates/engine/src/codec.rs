//! Compiled codecs
//!
//! A [`CompiledRecord`] is the per-(record type, dialect) routine the cache
//! hands out: one [`Node`] per field, resolved once through the strategy
//! table, plus the record's own dispatch plan if it is self-discriminated.
//!
//! Nested records are not inlined. A `Record` node looks its target up in
//! the cache at call time under the propagated dialect, so a wrapper's
//! compiled codec never goes stale when a nested type gains subtypes.

use crate::builtin;
use crate::cache::CodecCache;
use crate::dialect::{propagate, Dialect};
use crate::dispatch::DispatchPlan;
use crate::error::{CodecError, Result, ROOT};
use crate::schema::{DiscriminatorSpec, RecordType, SemType};
use crate::strategy::{DecodeFn, EncodeFn, StrategyTable, TypeKey};
use crate::subtype::{DispatchSite, Hierarchy};
use shapeshift_core::{Data, Record, RecordTypeId, Tag, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Per-call state threaded through every routine
pub(crate) struct Ctx<'a> {
    pub(crate) cache: &'a CodecCache,
    pub(crate) hierarchy: &'a Hierarchy,
    pub(crate) dialect: Option<&'a Arc<Dialect>>,
    pub(crate) depth: usize,
    pub(crate) max_depth: usize,
}

impl<'a> Ctx<'a> {
    /// Step into a nested record under its effective dialect
    pub(crate) fn descend<'b>(&'b self, dialect: Option<&'b Arc<Dialect>>) -> Result<Ctx<'b>> {
        if self.depth >= self.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                path: ROOT.to_string(),
                limit: self.max_depth,
            });
        }
        Ok(Ctx {
            cache: self.cache,
            hierarchy: self.hierarchy,
            dialect,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }

    pub(crate) fn record_type(&self, id: RecordTypeId) -> Result<&'a Arc<RecordType>> {
        self.hierarchy
            .get(id)
            .ok_or_else(|| CodecError::UnknownRecordType(id.to_string()))
    }
}

/// Field routine
pub(crate) enum Node {
    Any,
    Scalar(TypeKey),
    Literal(Tag),
    List(Box<Node>),
    Dict(Box<Node>),
    Optional(Box<Node>),
    Union(Vec<Node>),
    Record(RecordTypeId),
    Dispatch(Arc<DispatchPlan>),
    Hooked(Box<Hooked>),
}

/// A key with at least one configured direction
pub(crate) struct Hooked {
    key: TypeKey,
    decode: Option<Arc<DecodeFn>>,
    encode: Option<Arc<EncodeFn>>,
    fallback: Option<Node>,
}

impl Hooked {
    fn decode(&self, raw: &Value, ctx: &Ctx<'_>) -> Result<Data> {
        match (&self.decode, &self.fallback) {
            (Some(f), _) => f(raw).map_err(|e| self.failed(e.0)),
            (None, Some(fallback)) => fallback.decode(raw, ctx),
            (None, None) => Err(self.missing()),
        }
    }

    fn encode(&self, data: &Data, ctx: &Ctx<'_>) -> Result<Value> {
        match (&self.encode, &self.fallback) {
            (Some(f), _) => f(data).map_err(|e| self.failed(e.0)),
            (None, Some(fallback)) => fallback.encode(data, ctx),
            (None, None) => Err(self.missing()),
        }
    }

    fn failed(&self, message: String) -> CodecError {
        CodecError::StrategyFailed {
            path: ROOT.to_string(),
            type_name: self.key.to_string(),
            message,
        }
    }

    fn missing(&self) -> CodecError {
        CodecError::NoStrategyAvailable {
            path: ROOT.to_string(),
            type_name: self.key.to_string(),
        }
    }
}

impl Node {
    pub(crate) fn decode(&self, raw: &Value, ctx: &Ctx<'_>) -> Result<Data> {
        match self {
            Node::Any => Ok(Data::from(raw.clone())),
            Node::Scalar(key) => builtin::decode(key, raw),
            Node::Literal(tag) => match Tag::from_value(raw) {
                Some(found) if &found == tag => Ok(tag.to_data()),
                _ => Err(CodecError::invalid(format!("literal {}", tag), describe_raw(raw))),
            },
            Node::List(element) => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| CodecError::invalid("list", raw.type_name()))?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| element.decode(item, ctx).map_err(|e| e.at_index(i)))
                    .collect::<Result<Vec<_>>>()
                    .map(Data::List)
            }
            Node::Dict(value) => {
                let map = raw
                    .as_object()
                    .ok_or_else(|| CodecError::invalid("dict", raw.type_name()))?;
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = BTreeMap::new();
                for key in keys {
                    let decoded = value.decode(&map[key], ctx).map_err(|e| e.at_key(key))?;
                    out.insert(key.clone(), decoded);
                }
                Ok(Data::Dict(out))
            }
            Node::Optional(inner) => match raw {
                Value::Null => Ok(Data::Null),
                _ => inner.decode(raw, ctx),
            },
            Node::Union(members) => members
                .iter()
                .find_map(|m| m.decode(raw, ctx).ok())
                .ok_or_else(|| CodecError::invalid("a union member", raw.type_name())),
            Node::Record(id) => decode_nested(ctx.record_type(*id)?, raw, ctx).map(Data::Record),
            Node::Dispatch(plan) => plan.decode(raw, ctx).map(Data::Record),
            Node::Hooked(hooked) => hooked.decode(raw, ctx),
        }
    }

    pub(crate) fn encode(&self, data: &Data, ctx: &Ctx<'_>) -> Result<Value> {
        match self {
            Node::Any => Value::try_from(data).map_err(|e| CodecError::invalid("plain data", e.0)),
            Node::Scalar(key) => builtin::encode(key, data),
            Node::Literal(tag) => match Tag::from_data(data) {
                Some(found) if &found == tag => Ok(tag.to_value()),
                _ => Err(CodecError::invalid(format!("literal {}", tag), data.type_name())),
            },
            Node::List(element) => match data {
                Data::List(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| element.encode(item, ctx).map_err(|e| e.at_index(i)))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array),
                other => Err(CodecError::invalid("list", other.type_name())),
            },
            Node::Dict(value) => match data {
                Data::Dict(map) => {
                    let mut out = HashMap::with_capacity(map.len());
                    for (key, item) in map {
                        let encoded = value.encode(item, ctx).map_err(|e| e.at_key(key))?;
                        out.insert(key.clone(), encoded);
                    }
                    Ok(Value::Object(out))
                }
                other => Err(CodecError::invalid("dict", other.type_name())),
            },
            Node::Optional(inner) => match data {
                Data::Null => Ok(Value::Null),
                _ => inner.encode(data, ctx),
            },
            Node::Union(members) => members
                .iter()
                .find_map(|m| m.encode(data, ctx).ok())
                .ok_or_else(|| CodecError::invalid("a union member", data.type_name())),
            Node::Record(id) => encode_nested(*id, expect_record(data)?, ctx),
            Node::Dispatch(plan) => plan.encode(expect_record(data)?, ctx),
            Node::Hooked(hooked) => hooked.encode(data, ctx),
        }
    }
}

fn expect_record(data: &Data) -> Result<&Record> {
    data.as_record()
        .ok_or_else(|| CodecError::invalid("record", data.type_name()))
}

fn describe_raw(raw: &Value) -> String {
    match Tag::from_value(raw) {
        Some(tag) => tag.to_string(),
        None => raw.type_name().to_string(),
    }
}

struct CompiledField {
    name: String,
    default: Option<Data>,
    node: Node,
}

/// Compiled routine pair for one record type under one effective dialect
pub struct CompiledRecord {
    ty: Arc<RecordType>,
    dialect: Option<Arc<Dialect>>,
    fields: Vec<CompiledField>,
    dispatch: Option<Arc<DispatchPlan>>,
    roots: Vec<RecordTypeId>,
    stamp: u64,
    forbid_extra_keys: bool,
}

impl CompiledRecord {
    /// Record type this codec is for
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Effective dialect the field routines were resolved under
    pub fn dialect(&self) -> Option<&Arc<Dialect>> {
        self.dialect.as_ref()
    }

    /// Roots of every dispatch site this codec contains
    pub fn dispatch_roots(&self) -> &[RecordTypeId] {
        &self.roots
    }

    /// Combined root generation at build time
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// Whether the codec is still valid against `hierarchy`
    pub fn is_current(&self, hierarchy: &Hierarchy) -> bool {
        self.stamp == hierarchy.stamp(&self.roots)
    }

    pub(crate) fn dispatch(&self) -> Option<&Arc<DispatchPlan>> {
        self.dispatch.as_ref()
    }

    /// Decode, dispatching first if the type is self-discriminated
    pub(crate) fn decode(&self, raw: &Value, ctx: &Ctx<'_>) -> Result<Record> {
        match &self.dispatch {
            Some(plan) => plan.decode(raw, ctx),
            None => self.decode_fields(raw, ctx),
        }
    }

    /// Decode the whole input under this type's own schema
    pub(crate) fn decode_fields(&self, raw: &Value, ctx: &Ctx<'_>) -> Result<Record> {
        let object = raw.as_object().ok_or_else(|| {
            CodecError::invalid(format!("object for '{}'", self.ty.name()), raw.type_name())
        })?;

        if self.forbid_extra_keys {
            let mut extra: Vec<&String> = object
                .keys()
                .filter(|k| !self.fields.iter().any(|f| &f.name == *k))
                .collect();
            extra.sort();
            if let Some(key) = extra.first() {
                return Err(CodecError::UnexpectedField {
                    path: ROOT.to_string(),
                    field: key.to_string(),
                });
            }
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = match (object.get(&field.name), &field.default) {
                (Some(raw_value), _) => field
                    .node
                    .decode(raw_value, ctx)
                    .map_err(|e| e.at_field(&field.name))?,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(CodecError::MissingField {
                        path: ROOT.to_string(),
                        field: field.name.clone(),
                    })
                }
            };
            fields.push((field.name.clone(), value));
        }
        Ok(Record::new(self.ty.id(), Arc::clone(self.ty.shared_name()), fields))
    }

    /// Encode a record of exactly this type
    pub(crate) fn encode_fields(&self, record: &Record, ctx: &Ctx<'_>) -> Result<Value> {
        if let Some((name, _)) = record
            .fields()
            .iter()
            .find(|(name, _)| !self.fields.iter().any(|f| &f.name == name))
        {
            return Err(CodecError::UnexpectedField {
                path: ROOT.to_string(),
                field: name.clone(),
            });
        }

        let omit_none = self.ty.omit_none();
        let mut out = HashMap::with_capacity(self.fields.len());
        for field in &self.fields {
            let data = match (record.get(&field.name), &field.default) {
                (Some(data), _) => data,
                (None, Some(default)) => default,
                (None, None) => {
                    return Err(CodecError::MissingField {
                        path: ROOT.to_string(),
                        field: field.name.clone(),
                    })
                }
            };
            if omit_none && data.is_null() {
                continue;
            }
            let encoded = field
                .node
                .encode(data, ctx)
                .map_err(|e| e.at_field(&field.name))?;
            out.insert(field.name.clone(), encoded);
        }
        Ok(Value::Object(out))
    }
}

/// Decode a nested record, dispatching if its type is self-discriminated
pub(crate) fn decode_nested(ty: &Arc<RecordType>, raw: &Value, ctx: &Ctx<'_>) -> Result<Record> {
    let compiled = ctx
        .cache
        .get_or_build(ctx.hierarchy, ty, propagate(ty, ctx.dialect))?;
    let inner = ctx.descend(compiled.dialect())?;
    compiled.decode(raw, &inner)
}

/// Decode the whole input as exactly `ty`
pub(crate) fn decode_concrete(ty: &Arc<RecordType>, raw: &Value, ctx: &Ctx<'_>) -> Result<Record> {
    let compiled = ctx
        .cache
        .get_or_build(ctx.hierarchy, ty, propagate(ty, ctx.dialect))?;
    let inner = ctx.descend(compiled.dialect())?;
    compiled.decode_fields(raw, &inner)
}

/// Encode a record placed in a slot declared as `declared`
pub(crate) fn encode_nested(declared: RecordTypeId, record: &Record, ctx: &Ctx<'_>) -> Result<Value> {
    if !ctx.hierarchy.is_descendant(record.ty(), declared) {
        let expected = ctx.record_type(declared)?.name().to_string();
        return Err(CodecError::UnsupportedVariant {
            path: ROOT.to_string(),
            record: record.type_name().to_string(),
            expected,
        });
    }
    encode_concrete(record, ctx)
}

/// Encode a record with its own concrete type's codec
pub(crate) fn encode_concrete(record: &Record, ctx: &Ctx<'_>) -> Result<Value> {
    let ty = ctx.record_type(record.ty())?;
    let compiled = ctx
        .cache
        .get_or_build(ctx.hierarchy, ty, propagate(ty, ctx.dialect))?;
    let inner = ctx.descend(compiled.dialect())?;
    compiled.encode_fields(record, &inner)
}

/// Compile the codec for `ty` under an effective dialect
pub(crate) fn compile_record(
    hierarchy: &Hierarchy,
    ty: &Arc<RecordType>,
    dialect: Option<Arc<Dialect>>,
    forbid_extra_keys: bool,
) -> Result<CompiledRecord> {
    let mut roots = Vec::new();
    let dispatch = match ty.discriminator() {
        Some(spec) => {
            roots.push(ty.id());
            let site = DispatchSite::self_discriminated(ty.id(), spec.clone());
            Some(Arc::new(DispatchPlan::build(hierarchy, site)?))
        }
        None => None,
    };

    let mut fields = Vec::with_capacity(ty.fields().len());
    {
        let table = StrategyTable::new(dialect.as_deref(), ty.overrides());
        for field in ty.fields() {
            let node = match field.discriminator() {
                Some(spec) => compile_dispatch(hierarchy, field.ty(), spec, &mut roots),
                None => compile_type(&table, field.ty()),
            }
            .map_err(|e| e.at_field(field.name()))?;
            fields.push(CompiledField {
                name: field.name().to_string(),
                default: field.default().cloned(),
                node,
            });
        }
    }

    Ok(CompiledRecord {
        ty: Arc::clone(ty),
        stamp: hierarchy.stamp(&roots),
        roots,
        dialect,
        fields,
        dispatch,
        forbid_extra_keys: ty.forbid_extra_keys().unwrap_or(forbid_extra_keys),
    })
}

fn compile_type(table: &StrategyTable<'_>, ty: &SemType) -> Result<Node> {
    let Some(key) = ty.key() else {
        return compile_structural(table, ty);
    };

    let decode = table.resolve_decode(&key)?;
    let encode = table.resolve_encode(&key)?;
    if decode.is_builtin() && encode.is_builtin() {
        return compile_builtin(table, ty, key);
    }

    let fallback = if decode.is_builtin() || encode.is_builtin() {
        Some(compile_builtin(table, ty, key.clone())?)
    } else {
        None
    };
    Ok(Node::Hooked(Box::new(Hooked {
        key,
        decode: decode.into_override(),
        encode: encode.into_override(),
        fallback,
    })))
}

fn compile_structural(table: &StrategyTable<'_>, ty: &SemType) -> Result<Node> {
    Ok(match ty {
        SemType::Optional(inner) => Node::Optional(Box::new(compile_type(table, inner)?)),
        SemType::Literal(tag) => Node::Literal(tag.clone()),
        SemType::Record(id) => Node::Record(*id),
        SemType::Union(members) => Node::Union(
            members
                .iter()
                .map(|m| compile_type(table, m))
                .collect::<Result<Vec<_>>>()?,
        ),
        _ => Node::Any,
    })
}

fn compile_builtin(table: &StrategyTable<'_>, ty: &SemType, key: TypeKey) -> Result<Node> {
    Ok(match ty {
        SemType::List(inner) => Node::List(Box::new(compile_type(table, inner)?)),
        SemType::Dict(inner) => Node::Dict(Box::new(compile_type(table, inner)?)),
        _ if builtin::is_scalar(&key) => Node::Scalar(key),
        _ => {
            return Err(CodecError::NoStrategyAvailable {
                path: ROOT.to_string(),
                type_name: key.to_string(),
            })
        }
    })
}

fn compile_dispatch(
    hierarchy: &Hierarchy,
    ty: &SemType,
    spec: &DiscriminatorSpec,
    roots: &mut Vec<RecordTypeId>,
) -> Result<Node> {
    if let SemType::Optional(inner) = ty {
        return Ok(Node::Optional(Box::new(compile_dispatch(
            hierarchy, inner, spec, roots,
        )?)));
    }
    let site_roots = ty
        .dispatch_roots()
        .ok_or_else(|| CodecError::invalid("record type or union of record types", "other type"))?;
    roots.extend(site_roots.iter().copied());
    let plan = DispatchPlan::build(hierarchy, DispatchSite::annotated(site_roots, spec.clone()))?;
    Ok(Node::Dispatch(Arc::new(plan)))
}
