//! Convenient imports for Shapeshift.
//!
//! ```ignore
//! use shapeshift::prelude::*;
//!
//! let codec = Shapeshift::new();
//! let id = codec.define(RecordDef::new("Point").field("x", SemType::Int))?;
//! ```

// Main entry point
pub use crate::codec::{Shapeshift, ShapeshiftBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Definitions
pub use crate::types::{DiscriminatorSpec, RecordDef, SemType};

// Dialects and strategies
pub use crate::types::{Dialect, Strategy, StrategyError, TypeKey};

// Values
pub use crate::types::{Data, Record, RecordTypeId, Tag, Value};
