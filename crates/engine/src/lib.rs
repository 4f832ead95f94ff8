//! Codec engine for Shapeshift
//!
//! This crate turns record type definitions into compiled codecs:
//! - Dialects: named strategy bundles, scoped per record type
//! - Strategy resolution: dialect, then record override, then built-in
//! - Subtype registry: hierarchy arena with per-root generations
//! - Discriminator dispatch: tag lookup to the concrete subtype
//! - Codec cache keyed by (record type, effective dialect)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod cache;
pub mod codec;
pub mod dialect;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod options;
pub mod schema;
pub mod strategy;
pub mod subtype;

pub use cache::{CacheStats, CodecCache};
pub use codec::CompiledRecord;
pub use dialect::{propagate, resolve_effective, Dialect, DialectBuilder, DialectId, DialectRegistry};
pub use dispatch::DispatchPlan;
pub use engine::Engine;
pub use error::{CodecError, Result};
pub use options::{EngineOptions, OptionsError};
pub use schema::{DiscriminatorSpec, FieldDescriptor, RecordDef, RecordType, SemType};
pub use strategy::{
    DecodeFn, EncodeFn, Resolved, Strategy, StrategyError, StrategyMap, StrategySource,
    StrategyTable, TypeKey,
};
pub use subtype::{DispatchSite, Hierarchy, SubtypeRegistry, TagIndex};

// Value model re-exported for convenience
pub use shapeshift_core::{Data, Record, RecordTypeId, Tag, Value};
