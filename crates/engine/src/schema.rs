//! Record schemas
//!
//! [`RecordDef`] is the mutable description a caller hands to
//! `Engine::define`; the engine turns it into an immutable [`RecordType`]
//! after merging in everything inherited from the parent.
//!
//! Inheritance rules:
//! - parent fields come first; redefining a field replaces it in place
//! - discriminator, default dialect and flags are inherited unless set
//! - strategy overrides merge, the subtype's own entry wins

use crate::dialect::Dialect;
use crate::error::{CodecError, Result};
use crate::strategy::{Strategy, StrategyMap, TypeKey};
use shapeshift_core::{Data, RecordTypeId, Tag};
use std::sync::Arc;

/// Declared semantic type of a field
#[derive(Debug, Clone, PartialEq)]
pub enum SemType {
    /// Untyped; raw trees are lifted as-is
    Any,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Float
    Float,
    /// String
    Str,
    /// Binary data
    Bytes,
    /// Calendar date
    Date,
    /// Date and time
    DateTime,
    /// Sequence of one element type
    List(Box<SemType>),
    /// String-keyed mapping to one value type
    Dict(Box<SemType>),
    /// Value or null
    Optional(Box<SemType>),
    /// Exactly one literal scalar
    Literal(Tag),
    /// Nested record
    Record(RecordTypeId),
    /// First member that accepts the value
    Union(Vec<SemType>),
    /// User type, needs a strategy
    Named(Arc<str>),
}

impl SemType {
    /// `list[inner]`
    pub fn list(inner: SemType) -> Self {
        SemType::List(Box::new(inner))
    }

    /// `dict[str, inner]`
    pub fn dict(inner: SemType) -> Self {
        SemType::Dict(Box::new(inner))
    }

    /// `optional[inner]`
    pub fn optional(inner: SemType) -> Self {
        SemType::Optional(Box::new(inner))
    }

    /// User type by name
    pub fn named(name: impl AsRef<str>) -> Self {
        SemType::Named(Arc::from(name.as_ref()))
    }

    /// Union of record types
    pub fn union_of(members: impl IntoIterator<Item = RecordTypeId>) -> Self {
        SemType::Union(members.into_iter().map(SemType::Record).collect())
    }

    /// Strategy key for this type, `None` for purely structural types
    pub fn key(&self) -> Option<TypeKey> {
        Some(match self {
            SemType::Bool => TypeKey::Bool,
            SemType::Int => TypeKey::Int,
            SemType::Float => TypeKey::Float,
            SemType::Str => TypeKey::Str,
            SemType::Bytes => TypeKey::Bytes,
            SemType::Date => TypeKey::Date,
            SemType::DateTime => TypeKey::DateTime,
            SemType::List(_) => TypeKey::List,
            SemType::Dict(_) => TypeKey::Dict,
            SemType::Named(name) => TypeKey::Named(Arc::clone(name)),
            SemType::Any
            | SemType::Optional(_)
            | SemType::Literal(_)
            | SemType::Record(_)
            | SemType::Union(_) => return None,
        })
    }

    /// Record types a discriminator annotation on this type dispatches among
    ///
    /// Accepts a record type, a union of record types, or an optional of
    /// either.
    pub fn dispatch_roots(&self) -> Option<Vec<RecordTypeId>> {
        match self {
            SemType::Record(id) => Some(vec![*id]),
            SemType::Union(members) => members
                .iter()
                .map(|m| match m {
                    SemType::Record(id) => Some(*id),
                    _ => None,
                })
                .collect(),
            SemType::Optional(inner) => inner.dispatch_roots(),
            _ => None,
        }
    }

    /// Every record type this type mentions
    pub fn referenced_records(&self, out: &mut Vec<RecordTypeId>) {
        match self {
            SemType::Record(id) => out.push(*id),
            SemType::List(inner) | SemType::Dict(inner) | SemType::Optional(inner) => {
                inner.referenced_records(out)
            }
            SemType::Union(members) => {
                for member in members {
                    member.referenced_records(out);
                }
            }
            _ => {}
        }
    }
}

/// Discriminator configuration
///
/// The explicit variant set is the annotated type itself (the union's
/// members, or the single record type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscriminatorSpec {
    field: String,
    include_subtypes: bool,
    include_supertypes: bool,
}

impl DiscriminatorSpec {
    /// Dispatch on `field` among the explicit variants only
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            include_subtypes: false,
            include_supertypes: false,
        }
    }

    /// Also consider every registered descendant of the variants
    pub fn include_subtypes(mut self) -> Self {
        self.include_subtypes = true;
        self
    }

    /// Keep the variants themselves as candidates when subtypes are included
    pub fn include_supertypes(mut self) -> Self {
        self.include_supertypes = true;
        self
    }

    /// Tag field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether descendants are candidates
    pub fn includes_subtypes(&self) -> bool {
        self.include_subtypes
    }

    /// Whether the roots are candidates alongside their descendants
    pub fn includes_supertypes(&self) -> bool {
        self.include_supertypes
    }
}

/// One field of a record type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    ty: SemType,
    default: Option<Data>,
    discriminator: Option<DiscriminatorSpec>,
}

impl FieldDescriptor {
    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn ty(&self) -> &SemType {
        &self.ty
    }

    /// Default value, used when the field is absent from input
    pub fn default(&self) -> Option<&Data> {
        self.default.as_ref()
    }

    /// Discriminator annotation
    pub fn discriminator(&self) -> Option<&DiscriminatorSpec> {
        self.discriminator.as_ref()
    }
}

/// Immutable, fully resolved record type
#[derive(Debug)]
pub struct RecordType {
    id: RecordTypeId,
    name: Arc<str>,
    parent: Option<RecordTypeId>,
    fields: Vec<FieldDescriptor>,
    discriminator: Option<DiscriminatorSpec>,
    dialect: Option<Arc<Dialect>>,
    overrides: StrategyMap,
    allows_call_site_dialect: bool,
    forbid_extra_keys: Option<bool>,
    omit_none: bool,
}

impl RecordType {
    /// Identity
    pub fn id(&self) -> RecordTypeId {
        self.id
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared name, as stored in decoded records
    pub fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    /// Parent type
    pub fn parent(&self) -> Option<RecordTypeId> {
        self.parent
    }

    /// Fields, inherited ones first
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Self-discrimination configuration
    pub fn discriminator(&self) -> Option<&DiscriminatorSpec> {
        self.discriminator.as_ref()
    }

    /// Configured default dialect
    pub fn dialect(&self) -> Option<&Arc<Dialect>> {
        self.dialect.as_ref()
    }

    /// Own strategy overrides (inherited ones merged in)
    pub fn overrides(&self) -> &StrategyMap {
        &self.overrides
    }

    /// Whether a call-site dialect may replace the default
    pub fn allows_call_site_dialect(&self) -> bool {
        self.allows_call_site_dialect
    }

    /// Unknown-key policy, `None` defers to the engine option
    pub fn forbid_extra_keys(&self) -> Option<bool> {
        self.forbid_extra_keys
    }

    /// Whether null fields are skipped on encode
    pub fn omit_none(&self) -> bool {
        self.omit_none
    }

    /// Literal tag this type carries in `field`, if its default is a tag scalar
    pub fn tag(&self, field: &str) -> Option<Tag> {
        self.field(field)
            .and_then(|f| f.default.as_ref())
            .and_then(Tag::from_data)
    }
}

/// Record type description passed to `define`
///
/// ```ignore
/// let sub = engine.define(
///     RecordDef::new("Variant1Subtype1")
///         .extends(base)
///         .tag("type", 1),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct RecordDef {
    name: String,
    parent: Option<RecordTypeId>,
    fields: Vec<FieldDescriptor>,
    discriminator: Option<DiscriminatorSpec>,
    dialect: Option<Arc<Dialect>>,
    overrides: StrategyMap,
    allows_call_site_dialect: Option<bool>,
    forbid_extra_keys: Option<bool>,
    omit_none: Option<bool>,
}

impl RecordDef {
    /// Start a definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            discriminator: None,
            dialect: None,
            overrides: StrategyMap::default(),
            allows_call_site_dialect: None,
            forbid_extra_keys: None,
            omit_none: None,
        }
    }

    /// Name being defined
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent being extended
    pub fn parent(&self) -> Option<RecordTypeId> {
        self.parent
    }

    /// Extend a defined record type
    pub fn extends(mut self, parent: RecordTypeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Required field
    pub fn field(self, name: impl Into<String>, ty: SemType) -> Self {
        self.push(name.into(), ty, None, None)
    }

    /// Field with a default
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        ty: SemType,
        default: impl Into<Data>,
    ) -> Self {
        self.push(name.into(), ty, Some(default.into()), None)
    }

    /// Literal tag field, e.g. `type: Literal[1] = 1`
    pub fn tag(self, name: impl Into<String>, tag: impl Into<Tag>) -> Self {
        let tag = tag.into();
        let default = tag.to_data();
        self.push(name.into(), SemType::Literal(tag), Some(default), None)
    }

    /// Field whose value dispatches polymorphically on a tag
    pub fn discriminated_field(
        self,
        name: impl Into<String>,
        ty: SemType,
        spec: DiscriminatorSpec,
    ) -> Self {
        self.push(name.into(), ty, None, Some(spec))
    }

    /// Make this type the root of a tagged hierarchy
    pub fn discriminator(mut self, spec: DiscriminatorSpec) -> Self {
        self.discriminator = Some(spec);
        self
    }

    /// Default dialect
    pub fn dialect(mut self, dialect: Arc<Dialect>) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Type-level strategy override
    pub fn strategy(mut self, key: TypeKey, strategy: Strategy) -> Self {
        self.overrides.insert(key, strategy);
        self
    }

    /// Accept dialects passed at the call site
    pub fn allow_call_site_dialect(mut self) -> Self {
        self.allows_call_site_dialect = Some(true);
        self
    }

    /// Reject input keys that are not fields
    pub fn forbid_extra_keys(mut self) -> Self {
        self.forbid_extra_keys = Some(true);
        self
    }

    /// Skip null fields on encode
    pub fn omit_none(mut self) -> Self {
        self.omit_none = Some(true);
        self
    }

    fn push(
        mut self,
        name: String,
        ty: SemType,
        default: Option<Data>,
        discriminator: Option<DiscriminatorSpec>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name,
            ty,
            default,
            discriminator,
        });
        self
    }

    /// Resolve against the parent into an immutable record type
    ///
    /// Checks that only depend on the definition itself happen here; checks
    /// against other defined types belong to the subtype registry.
    pub(crate) fn build(self, id: RecordTypeId, parent: Option<&RecordType>) -> Result<RecordType> {
        let invalid = |reason: String| CodecError::InvalidDefinition {
            record: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }

        let mut fields = parent.map(|p| p.fields.clone()).unwrap_or_default();
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(invalid(format!("field '{}' declared twice", field.name)));
            }
            if let Some(spec) = &field.discriminator {
                if field.ty.dispatch_roots().is_none() {
                    return Err(invalid(format!(
                        "field '{}' carries discriminator '{}' but is not a record type or union of record types",
                        field.name,
                        spec.field()
                    )));
                }
            }
            match fields.iter_mut().find(|f| f.name == field.name) {
                Some(slot) => *slot = field.clone(),
                None => fields.push(field.clone()),
            }
        }

        let discriminator = self
            .discriminator
            .clone()
            .or_else(|| parent.and_then(|p| p.discriminator.clone()));
        if let Some(spec) = &self.discriminator {
            if !spec.includes_subtypes() {
                return Err(invalid(format!(
                    "type-level discriminator '{}' must include subtypes",
                    spec.field()
                )));
            }
        }

        let mut overrides = parent.map(|p| p.overrides.clone()).unwrap_or_default();
        overrides.extend(self.overrides.clone());

        Ok(RecordType {
            id,
            name: Arc::from(self.name.as_str()),
            parent: parent.map(|p| p.id),
            fields,
            discriminator,
            dialect: self
                .dialect
                .clone()
                .or_else(|| parent.and_then(|p| p.dialect.clone())),
            overrides,
            allows_call_site_dialect: self
                .allows_call_site_dialect
                .or_else(|| parent.map(|p| p.allows_call_site_dialect))
                .unwrap_or(false),
            forbid_extra_keys: self
                .forbid_extra_keys
                .or_else(|| parent.and_then(|p| p.forbid_extra_keys)),
            omit_none: self
                .omit_none
                .or_else(|| parent.map(|p| p.omit_none))
                .unwrap_or(false),
        })
    }
}
