//! Public types for the Shapeshift API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// Value model
pub use shapeshift_core::{Data, Record, RecordTypeId, Tag, Value};

// Definitions
pub use shapeshift_engine::{DiscriminatorSpec, FieldDescriptor, RecordDef, RecordType, SemType};

// Dialects and strategies
pub use shapeshift_engine::{Dialect, DialectRegistry, Strategy, StrategyError, TypeKey};

// Errors and options from the engine
pub use shapeshift_engine::{CacheStats, CodecError, EngineOptions, OptionsError};

// Engine, for callers that want it without the facade
pub use shapeshift_engine::Engine;

// Wire errors
pub use shapeshift_wire::DecodeError;
