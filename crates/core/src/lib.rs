//! Value model for Shapeshift
//!
//! Two value shapes meet at the serialization boundary:
//!
//! - [`Value`]: the raw tree (mappings, sequences, scalars) exchanged with the
//!   wire-text bridge. It knows nothing about record types.
//! - [`Data`]: the decoded, typed side. Dates are dates, records are
//!   [`Record`]s carrying the identity of their concrete record type.
//!
//! [`Tag`] is the literal scalar a discriminator field holds, and
//! [`RecordTypeId`] is the arena index of a defined record type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod data;
pub mod types;
pub mod value;

pub use data::{Data, NotPlainData, Record};
pub use types::{RecordTypeId, Tag};
pub use value::{SpecialFloatKind, Value};
