//! Dialects and dialect resolution
//!
//! A [`Dialect`] is a named, immutable bundle of per-type strategy
//! overrides. It is built once through [`DialectBuilder`] and shared as
//! `Arc<Dialect>`; every dialect gets a process-unique [`DialectId`] that the
//! codec cache uses as its identity.
//!
//! ## Effective dialect
//!
//! For a top-level call on record type `R` with call-site dialect `D?`:
//!
//! 1. `D`, only if `R` allows call-site dialects (otherwise the call fails
//!    with `DialectNotSupported`)
//! 2. `R`'s configured default dialect
//! 3. none
//!
//! Nested records and dispatched subtypes receive the caller's effective
//! dialect through [`propagate`], which applies the same order without
//! failing.

use crate::error::{CodecError, Result};
use crate::schema::RecordType;
use crate::strategy::{Strategy, StrategyMap, TypeKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_DIALECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique dialect identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialectId(u64);

impl DialectId {
    fn next() -> Self {
        DialectId(NEXT_DIALECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DialectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialect#{}", self.0)
    }
}

/// Named bundle of strategy overrides
///
/// Identity is per built instance, not per name: two dialects built with
/// the same name get separate codec cache entries. Build a dialect once and
/// share the `Arc`; the cache prunes entries for dialects nobody else holds.
pub struct Dialect {
    id: DialectId,
    name: Arc<str>,
    strategies: StrategyMap,
}

impl Dialect {
    /// Start building a dialect
    pub fn builder(name: impl AsRef<str>) -> DialectBuilder {
        DialectBuilder {
            name: Arc::from(name.as_ref()),
            strategies: StrategyMap::default(),
        }
    }

    /// Identity of this dialect
    pub fn id(&self) -> DialectId {
        self.id
    }

    /// Dialect name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Override for a type key
    pub fn strategy(&self, key: &TypeKey) -> Option<&Strategy> {
        self.strategies.get(key)
    }

    /// Type keys this dialect overrides
    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.strategies.keys()
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("keys", &self.strategies.len())
            .finish()
    }
}

/// Builder for [`Dialect`]
pub struct DialectBuilder {
    name: Arc<str>,
    strategies: StrategyMap,
}

impl DialectBuilder {
    /// Override a type key. A later call for the same key replaces the earlier one.
    pub fn strategy(mut self, key: TypeKey, strategy: Strategy) -> Self {
        self.strategies.insert(key, strategy);
        self
    }

    /// Freeze the dialect
    pub fn build(self) -> Arc<Dialect> {
        Arc::new(Dialect {
            id: DialectId::next(),
            name: self.name,
            strategies: self.strategies,
        })
    }
}

/// Dialects by name
///
/// Names are write-once: a dialect cannot be replaced after registration.
#[derive(Default)]
pub struct DialectRegistry {
    by_name: RwLock<HashMap<Arc<str>, Arc<Dialect>>>,
}

impl DialectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dialect under its name
    pub fn register(&self, dialect: Arc<Dialect>) -> Result<()> {
        let mut by_name = self.by_name.write();
        if by_name.contains_key(dialect.name()) {
            return Err(CodecError::DialectExists(dialect.name().to_string()));
        }
        by_name.insert(Arc::clone(&dialect.name), dialect);
        Ok(())
    }

    /// Look up a dialect by name
    pub fn get(&self, name: &str) -> Option<Arc<Dialect>> {
        self.by_name.read().get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.read().keys().map(|n| n.to_string()).collect();
        names.sort();
        names
    }

    /// Number of registered dialects
    pub fn len(&self) -> usize {
        self.by_name.read().len()
    }

    /// Check if no dialect is registered
    pub fn is_empty(&self) -> bool {
        self.by_name.read().is_empty()
    }
}

/// Effective dialect for a top-level call
pub fn resolve_effective(
    record: &RecordType,
    call_site: Option<&Arc<Dialect>>,
) -> Result<Option<Arc<Dialect>>> {
    match call_site {
        Some(dialect) if record.allows_call_site_dialect() => Ok(Some(Arc::clone(dialect))),
        Some(dialect) => Err(CodecError::DialectNotSupported {
            record: record.name().to_string(),
            dialect: dialect.name().to_string(),
        }),
        None => Ok(record.dialect().cloned()),
    }
}

/// Effective dialect for a nested record, given the caller's
pub fn propagate(record: &RecordType, inherited: Option<&Arc<Dialect>>) -> Option<Arc<Dialect>> {
    match inherited {
        Some(dialect) if record.allows_call_site_dialect() => Some(Arc::clone(dialect)),
        _ => record.dialect().cloned(),
    }
}
