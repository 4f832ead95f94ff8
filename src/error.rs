//! Unified error types for Shapeshift.
//!
//! This module wraps the errors of each layer in one enum so callers can use
//! a single `Result` across definition, conversion and configuration.

use shapeshift_engine::{CodecError, OptionsError};
use shapeshift_wire::DecodeError;
use thiserror::Error;

/// All Shapeshift errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Definition, strategy resolution, dispatch or conversion failure
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Input text is not valid JSON
    #[error("wire error: {0}")]
    Wire(#[from] DecodeError),

    /// Options could not be loaded
    #[error(transparent)]
    Config(#[from] OptionsError),
}

/// Result type for Shapeshift operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Codec(e) => e.code(),
            Error::Wire(_) => "InvalidWireText",
            Error::Config(_) => "InvalidOptions",
        }
    }

    /// Check if the caller's input was at fault, as opposed to a definition.
    pub fn is_input_error(&self) -> bool {
        match self {
            Error::Codec(e) => e.is_input_error(),
            Error::Wire(_) => true,
            Error::Config(_) => false,
        }
    }

    /// Check if this is a codec error.
    pub fn is_codec(&self) -> bool {
        matches!(self, Error::Codec(_))
    }

    /// Check if this is a wire-text error.
    pub fn is_wire(&self) -> bool {
        matches!(self, Error::Wire(_))
    }

    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Underlying codec error, if any.
    pub fn as_codec(&self) -> Option<&CodecError> {
        match self {
            Error::Codec(e) => Some(e),
            _ => None,
        }
    }
}
