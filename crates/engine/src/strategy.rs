//! Strategy table
//!
//! A [`Strategy`] is an optional decode half plus an optional encode half
//! registered for one [`TypeKey`]. [`StrategyTable`] resolves the routine
//! for a key, one direction at a time:
//!
//! 1. the effective dialect's override, if a dialect is in effect
//! 2. the owning record type's own override
//! 3. the builtin routine
//!
//! A strategy that only defines one half leaves the other direction to the
//! next level.

use crate::dialect::Dialect;
use crate::error::{CodecError, Result, ROOT};
use rustc_hash::FxHashMap;
use shapeshift_core::{Data, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// User decode routine: raw tree to decoded value
pub type DecodeFn = dyn Fn(&Value) -> std::result::Result<Data, StrategyError> + Send + Sync;

/// User encode routine: decoded value to raw tree
pub type EncodeFn = dyn Fn(&Data) -> std::result::Result<Value, StrategyError> + Send + Sync;

/// Type-key to strategy overrides
pub type StrategyMap = FxHashMap<TypeKey, Strategy>;

/// Failure reported by a user strategy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StrategyError(pub String);

impl StrategyError {
    /// Create from any message
    pub fn new(message: impl Into<String>) -> Self {
        StrategyError(message.into())
    }
}

/// Semantic type a strategy can be registered for
///
/// Containers are keyed by their kind alone: a `dict` override applies to
/// every dict field regardless of its value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
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
    /// Sequence
    List,
    /// String-keyed mapping
    Dict,
    /// User type without builtin routines
    Named(Arc<str>),
}

impl TypeKey {
    /// Key for a user type
    pub fn named(name: impl AsRef<str>) -> Self {
        TypeKey::Named(Arc::from(name.as_ref()))
    }

    /// Whether the engine ships a routine for this key
    pub fn has_builtin(&self) -> bool {
        !matches!(self, TypeKey::Named(_))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Bool => f.write_str("bool"),
            TypeKey::Int => f.write_str("int"),
            TypeKey::Float => f.write_str("float"),
            TypeKey::Str => f.write_str("str"),
            TypeKey::Bytes => f.write_str("bytes"),
            TypeKey::Date => f.write_str("date"),
            TypeKey::DateTime => f.write_str("datetime"),
            TypeKey::List => f.write_str("list"),
            TypeKey::Dict => f.write_str("dict"),
            TypeKey::Named(name) => f.write_str(name),
        }
    }
}

/// Decode/encode override pair
#[derive(Clone, Default)]
pub struct Strategy {
    decode: Option<Arc<DecodeFn>>,
    encode: Option<Arc<EncodeFn>>,
}

impl Strategy {
    /// Empty strategy; both directions fall through
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy with both halves
    pub fn pair<D, E>(decode: D, encode: E) -> Self
    where
        D: Fn(&Value) -> std::result::Result<Data, StrategyError> + Send + Sync + 'static,
        E: Fn(&Data) -> std::result::Result<Value, StrategyError> + Send + Sync + 'static,
    {
        Self::new().decode(decode).encode(encode)
    }

    /// Set the decode half
    pub fn decode<D>(mut self, decode: D) -> Self
    where
        D: Fn(&Value) -> std::result::Result<Data, StrategyError> + Send + Sync + 'static,
    {
        self.decode = Some(Arc::new(decode));
        self
    }

    /// Set the encode half
    pub fn encode<E>(mut self, encode: E) -> Self
    where
        E: Fn(&Data) -> std::result::Result<Value, StrategyError> + Send + Sync + 'static,
    {
        self.encode = Some(Arc::new(encode));
        self
    }

    /// Decode half, if set
    pub fn decoder(&self) -> Option<&Arc<DecodeFn>> {
        self.decode.as_ref()
    }

    /// Encode half, if set
    pub fn encoder(&self) -> Option<&Arc<EncodeFn>> {
        self.encode.as_ref()
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("decode", &self.decode.is_some())
            .field("encode", &self.encode.is_some())
            .finish()
    }
}

/// Precedence level a routine was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategySource {
    /// Effective dialect's override
    Dialect,
    /// Owning record type's override
    Record,
    /// Engine builtin
    Builtin,
}

/// Result of resolving one direction
pub enum Resolved<F: ?Sized> {
    /// A configured routine won
    Override(StrategySource, Arc<F>),
    /// Nothing configured; use the builtin
    Builtin,
}

impl<F: ?Sized> Resolved<F> {
    /// Level this resolution came from
    pub fn source(&self) -> StrategySource {
        match self {
            Resolved::Override(source, _) => *source,
            Resolved::Builtin => StrategySource::Builtin,
        }
    }

    /// Configured routine, `None` for the builtin
    pub fn into_override(self) -> Option<Arc<F>> {
        match self {
            Resolved::Override(_, f) => Some(f),
            Resolved::Builtin => None,
        }
    }

    /// Whether the builtin won
    pub fn is_builtin(&self) -> bool {
        matches!(self, Resolved::Builtin)
    }
}

/// Strategy lookup for one record type under one effective dialect
pub struct StrategyTable<'a> {
    dialect: Option<&'a Dialect>,
    own: &'a StrategyMap,
}

impl<'a> StrategyTable<'a> {
    /// Create a table for a record type's overrides and an effective dialect
    pub fn new(dialect: Option<&'a Dialect>, own: &'a StrategyMap) -> Self {
        Self { dialect, own }
    }

    /// Resolve the decode routine for a key
    pub fn resolve_decode(&self, key: &TypeKey) -> Result<Resolved<DecodeFn>> {
        let found = self
            .layers(key)
            .find_map(|(source, s)| s.decoder().map(|f| (source, Arc::clone(f))));
        Self::finish(key, found)
    }

    /// Resolve the encode routine for a key
    pub fn resolve_encode(&self, key: &TypeKey) -> Result<Resolved<EncodeFn>> {
        let found = self
            .layers(key)
            .find_map(|(source, s)| s.encoder().map(|f| (source, Arc::clone(f))));
        Self::finish(key, found)
    }

    fn layers<'k>(
        &'k self,
        key: &'k TypeKey,
    ) -> impl Iterator<Item = (StrategySource, &'k Strategy)> + 'k {
        let from_dialect = self
            .dialect
            .and_then(|d| d.strategy(key))
            .map(|s| (StrategySource::Dialect, s));
        let from_record = self.own.get(key).map(|s| (StrategySource::Record, s));
        from_dialect.into_iter().chain(from_record)
    }

    fn finish<F: ?Sized>(
        key: &TypeKey,
        found: Option<(StrategySource, Arc<F>)>,
    ) -> Result<Resolved<F>> {
        match found {
            Some((source, f)) => Ok(Resolved::Override(source, f)),
            None if key.has_builtin() => Ok(Resolved::Builtin),
            None => Err(CodecError::NoStrategyAvailable {
                path: ROOT.to_string(),
                type_name: key.to_string(),
            }),
        }
    }
}
