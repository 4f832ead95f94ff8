//! Error types for the codec engine
//!
//! Every failure is reported where it is detected, with the field path
//! (`$.x.y[0]`) that leads to it from the top-level record. Paths are built
//! bottom-up: a failure inside a field starts at `$` and each enclosing
//! container prepends its own segment while the error propagates.
//!
//! ## Error Codes
//!
//! | Code | Raised by |
//! |------|-----------|
//! | NoStrategyAvailable | codec compilation |
//! | DialectNotSupported | top-level call with a call-site dialect |
//! | MissingDiscriminant | dispatch, tag field absent |
//! | UnknownDiscriminant | dispatch, tag not registered |
//! | ConflictingDiscriminant | `define`, two types share a tag |
//! | UnsupportedVariant | encode, value type outside the variant set |
//! | InvalidValue | raw shape does not match the declared type |
//! | MissingField / UnexpectedField | record field set mismatch |
//! | StrategyFailed | user strategy returned an error |
//! | InvalidDefinition / UnknownRecordType | `define` validation |
//! | DialectExists | dialect registry |
//! | DepthLimitExceeded | nesting deeper than `max_depth` |

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Engine error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A field type has neither a builtin routine nor a configured strategy
    #[error("no strategy available for type '{type_name}' at {path}")]
    NoStrategyAvailable {
        /// Field path
        path: String,
        /// Type that lacks a routine
        type_name: String,
    },

    /// A call-site dialect was passed to a record type that does not accept one
    #[error("record type '{record}' does not accept call-site dialect '{dialect}'")]
    DialectNotSupported {
        /// Record type name
        record: String,
        /// Dialect name
        dialect: String,
    },

    /// Discriminated input without its tag field
    #[error("missing discriminator field '{field}' at {path}")]
    MissingDiscriminant {
        /// Field path
        path: String,
        /// Tag field name
        field: String,
    },

    /// Tag value that no candidate type carries
    #[error(
        "unknown discriminator value {tag} for field '{field}' at {path} (known: {})",
        .known.join(", ")
    )]
    UnknownDiscriminant {
        /// Field path
        path: String,
        /// Tag field name
        field: String,
        /// Offending tag, rendered
        tag: String,
        /// Tags known at this generation, sorted
        known: Vec<String>,
    },

    /// Two distinct concrete types claim the same tag in one dispatch site
    #[error("discriminator value {tag} for field '{field}' is claimed by both '{existing}' and '{incoming}'")]
    ConflictingDiscriminant {
        /// Tag field name
        field: String,
        /// Contested tag, rendered
        tag: String,
        /// Type that already holds the tag
        existing: String,
        /// Type that tried to claim it
        incoming: String,
    },

    /// Encoded value's type is not part of the expected variant set
    #[error("record type '{record}' is not a registered variant of {expected} at {path}")]
    UnsupportedVariant {
        /// Field path
        path: String,
        /// Runtime record type name
        record: String,
        /// Description of the accepted variants
        expected: String,
    },

    /// Raw or decoded value has the wrong shape
    #[error("invalid value at {path}: expected {expected}, found {found}")]
    InvalidValue {
        /// Field path
        path: String,
        /// Expected shape
        expected: String,
        /// Actual shape
        found: String,
    },

    /// Required field absent
    #[error("missing field '{field}' at {path}")]
    MissingField {
        /// Path of the enclosing record
        path: String,
        /// Field name
        field: String,
    },

    /// Field not declared by the record type
    #[error("unexpected field '{field}' at {path}")]
    UnexpectedField {
        /// Path of the enclosing record
        path: String,
        /// Field name
        field: String,
    },

    /// A configured strategy rejected its input
    #[error("strategy for '{type_name}' failed at {path}: {message}")]
    StrategyFailed {
        /// Field path
        path: String,
        /// Type key the strategy is registered for
        type_name: String,
        /// Strategy's own message
        message: String,
    },

    /// Record definition rejected
    #[error("invalid definition of '{record}': {reason}")]
    InvalidDefinition {
        /// Record type name
        record: String,
        /// Reason
        reason: String,
    },

    /// Reference to a record type that is not defined
    #[error("unknown record type: {0}")]
    UnknownRecordType(String),

    /// Dialect name already registered
    #[error("dialect already registered: {0}")]
    DialectExists(String),

    /// Nesting exceeded the configured depth
    #[error("nesting deeper than {limit} at {path}")]
    DepthLimitExceeded {
        /// Field path
        path: String,
        /// Configured limit
        limit: usize,
    },
}

impl CodecError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::NoStrategyAvailable { .. } => "NoStrategyAvailable",
            CodecError::DialectNotSupported { .. } => "DialectNotSupported",
            CodecError::MissingDiscriminant { .. } => "MissingDiscriminant",
            CodecError::UnknownDiscriminant { .. } => "UnknownDiscriminant",
            CodecError::ConflictingDiscriminant { .. } => "ConflictingDiscriminant",
            CodecError::UnsupportedVariant { .. } => "UnsupportedVariant",
            CodecError::InvalidValue { .. } => "InvalidValue",
            CodecError::MissingField { .. } => "MissingField",
            CodecError::UnexpectedField { .. } => "UnexpectedField",
            CodecError::StrategyFailed { .. } => "StrategyFailed",
            CodecError::InvalidDefinition { .. } => "InvalidDefinition",
            CodecError::UnknownRecordType(_) => "UnknownRecordType",
            CodecError::DialectExists(_) => "DialectExists",
            CodecError::DepthLimitExceeded { .. } => "DepthLimitExceeded",
        }
    }

    /// Field path, for errors raised while walking a value
    pub fn path(&self) -> Option<&str> {
        match self {
            CodecError::NoStrategyAvailable { path, .. }
            | CodecError::MissingDiscriminant { path, .. }
            | CodecError::UnknownDiscriminant { path, .. }
            | CodecError::UnsupportedVariant { path, .. }
            | CodecError::InvalidValue { path, .. }
            | CodecError::MissingField { path, .. }
            | CodecError::UnexpectedField { path, .. }
            | CodecError::StrategyFailed { path, .. }
            | CodecError::DepthLimitExceeded { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Check if the input (rather than the schema or the call) is at fault
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CodecError::MissingDiscriminant { .. }
                | CodecError::UnknownDiscriminant { .. }
                | CodecError::InvalidValue { .. }
                | CodecError::MissingField { .. }
                | CodecError::UnexpectedField { .. }
                | CodecError::StrategyFailed { .. }
                | CodecError::DepthLimitExceeded { .. }
        )
    }

    /// Prepend a record field segment to the path
    pub fn at_field(self, name: &str) -> Self {
        self.prefixed(&format!(".{}", name))
    }

    /// Prepend a list index segment to the path
    pub fn at_index(self, index: usize) -> Self {
        self.prefixed(&format!("[{}]", index))
    }

    /// Prepend a dict key segment to the path
    pub fn at_key(self, key: &str) -> Self {
        self.prefixed(&format!("[{:?}]", key))
    }

    fn prefixed(mut self, segment: &str) -> Self {
        if let Some(path) = self.path_mut() {
            // Paths always start with the root marker
            let rest = path.strip_prefix('$').unwrap_or(path.as_str());
            let updated = format!("${}{}", segment, rest);
            *path = updated;
        }
        self
    }

    fn path_mut(&mut self) -> Option<&mut String> {
        match self {
            CodecError::NoStrategyAvailable { path, .. }
            | CodecError::MissingDiscriminant { path, .. }
            | CodecError::UnknownDiscriminant { path, .. }
            | CodecError::UnsupportedVariant { path, .. }
            | CodecError::InvalidValue { path, .. }
            | CodecError::MissingField { path, .. }
            | CodecError::UnexpectedField { path, .. }
            | CodecError::StrategyFailed { path, .. }
            | CodecError::DepthLimitExceeded { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn invalid(expected: impl Into<String>, found: impl Into<String>) -> Self {
        CodecError::InvalidValue {
            path: ROOT.to_string(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Path of the value a routine was handed
pub(crate) const ROOT: &str = "$";
