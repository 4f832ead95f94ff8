//! # Shapeshift
//!
//! Record codec with dialect-scoped strategies and discriminator-based
//! subtype dispatch.
//!
//! Record types are declared at runtime with [`RecordDef`]. A record type can
//! carry a default [`Dialect`] (a bundle of per-type encode/decode
//! overrides), can accept dialects passed at the call site, and can act as
//! the root of a tagged hierarchy: decoding through the root reads the
//! discriminator field and produces the concrete subtype it names.
//!
//! ## Quick Start
//!
//! ```ignore
//! use shapeshift::prelude::*;
//!
//! let codec = Shapeshift::new();
//! let base = codec.define(
//!     RecordDef::new("Variant1")
//!         .field("x", SemType::Date)
//!         .discriminator(DiscriminatorSpec::new("type").include_subtypes()),
//! )?;
//! let sub = codec.define(RecordDef::new("Variant1Subtype1").extends(base).tag("type", 1))?;
//!
//! let record = codec.from_json(base, r#"{"x": "2023-06-03", "type": 1}"#, None)?;
//! assert_eq!(record.ty(), sub);
//! ```
//!
//! ## Dialect precedence
//!
//! The effective dialect is the one passed at the call site if the record
//! type allows it, otherwise the record type's own default. For each type
//! key the effective dialect's override wins, then the record type's own
//! override, then built-in behavior.
//!
//! Nested records inherit the caller's dialect only if they allow call-site
//! dialects themselves.
//!
//! ## Crates
//!
//! - `shapeshift-core`: raw trees, decoded data, tags
//! - `shapeshift-wire`: JSON text bridge
//! - `shapeshift-engine`: strategy resolution, subtype registry, dispatch, cache

#![warn(missing_docs)]

mod codec;
mod error;
mod types;

pub mod prelude;

// Re-export main entry points
pub use codec::{Shapeshift, ShapeshiftBuilder};
pub use error::{Error, Result};

// Re-export types
pub use types::*;
