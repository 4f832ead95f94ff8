//! Codec cache
//!
//! Compiled codecs keyed by (record type, effective dialect). Entries that
//! contain a dispatch plan carry the combined generation of their roots and
//! are rebuilt when a new subtype moves it; entries without dispatch sites
//! never expire.
//!
//! Codecs are compiled outside any map lock and published by insert, so a
//! reader sees either the old entry or the complete new one. Two threads
//! missing the same key may both compile; the last insert wins and both
//! results are equivalent.
//!
//! Dialect-scoped entries are keyed by [`DialectId`], which is unique per
//! built dialect. Once the entry count reaches a high-water mark, entries
//! whose dialect is referenced by nothing but the cache are dropped, so
//! building a throwaway dialect per call does not grow the map without
//! bound. Dialects kept by the caller, the dialect registry or a record
//! type's default are never pruned.

use crate::codec::{compile_record, CompiledRecord};
use crate::dialect::{Dialect, DialectId};
use crate::error::Result;
use crate::options::EngineOptions;
use crate::schema::RecordType;
use crate::subtype::Hierarchy;
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use shapeshift_core::RecordTypeId;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

type CacheKey = (RecordTypeId, Option<DialectId>);

/// Entry count that first triggers pruning
const PRUNE_FLOOR: usize = 256;

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups served from a current entry
    pub hits: u64,
    /// Lookups with no entry
    pub misses: u64,
    /// Lookups that found a stale entry
    pub rebuilds: u64,
    /// Entries currently held
    pub entries: usize,
}

/// Compiled codec cache
pub struct CodecCache {
    entries: DashMap<CacheKey, Arc<CompiledRecord>>,
    enabled: bool,
    forbid_extra_keys: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    rebuilds: AtomicU64,
    prune_at: AtomicUsize,
}

impl CodecCache {
    /// Create a cache configured by engine options
    pub fn new(options: &EngineOptions) -> Self {
        Self {
            entries: DashMap::new(),
            enabled: options.cache_codecs,
            forbid_extra_keys: options.forbid_extra_keys,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            rebuilds: AtomicU64::new(0),
            prune_at: AtomicUsize::new(PRUNE_FLOOR),
        }
    }

    /// Codec for `ty` under `dialect`, compiled on first use or when stale
    pub fn get_or_build(
        &self,
        hierarchy: &Hierarchy,
        ty: &Arc<RecordType>,
        dialect: Option<Arc<Dialect>>,
    ) -> Result<Arc<CompiledRecord>> {
        if !self.enabled {
            return compile_record(hierarchy, ty, dialect, self.forbid_extra_keys).map(Arc::new);
        }

        let key = (ty.id(), dialect.as_ref().map(|d| d.id()));
        // Clone out of the shard guard before any insert on the same key
        let cached = self.entries.get(&key).map(|entry| Arc::clone(entry.value()));
        match cached {
            Some(entry) if entry.is_current(hierarchy) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(record = %ty.name(), "codec cache hit");
                return Ok(entry);
            }
            Some(entry) => {
                self.rebuilds.fetch_add(1, Ordering::Relaxed);
                debug!(
                    record = %ty.name(),
                    stamp = entry.stamp(),
                    current = hierarchy.stamp(entry.dispatch_roots()),
                    "rebuilding stale codec"
                );
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        let dialect_name = dialect.as_ref().map(|d| d.name().to_string());
        let built = Arc::new(compile_record(
            hierarchy,
            ty,
            dialect,
            self.forbid_extra_keys,
        )?);
        debug!(
            record = %ty.name(),
            dialect = ?dialect_name,
            dispatch_roots = built.dispatch_roots().len(),
            "compiled codec"
        );
        self.entries.insert(key, Arc::clone(&built));

        if self.entries.len() >= self.prune_at.load(Ordering::Relaxed) {
            let dropped = self.prune_dialects();
            let entries = self.entries.len();
            self.prune_at
                .store((entries * 2).max(PRUNE_FLOOR), Ordering::Relaxed);
            debug!(dropped, entries, "pruned codecs for released dialects");
        }
        Ok(built)
    }

    /// Drop entries whose dialect is referenced only by cached codecs
    ///
    /// Returns the number of entries removed.
    pub fn prune_dialects(&self) -> usize {
        let mut cached: FxHashMap<DialectId, usize> = FxHashMap::default();
        for entry in self.entries.iter() {
            if let Some(dialect) = entry.value().dialect() {
                *cached.entry(dialect.id()).or_default() += 1;
            }
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| match entry.dialect() {
            Some(dialect) => {
                Arc::strong_count(dialect) > cached.get(&dialect.id()).copied().unwrap_or(0)
            }
            None => true,
        });
        before.saturating_sub(self.entries.len())
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Drop every entry; counters are kept
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether compiled codecs are kept
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
