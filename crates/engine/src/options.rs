//! Engine configuration
//!
//! Options can be built in code, taken from a preset, or loaded from TOML:
//!
//! ```toml
//! cache_codecs = true
//! max_depth = 64
//! forbid_extra_keys = true
//! ```
//!
//! Missing keys take their default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration rejected at load time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// TOML text could not be parsed into options
    #[error("failed to parse options: {0}")]
    Parse(String),

    /// Options parsed but are unusable
    #[error("invalid options: {0}")]
    Invalid(String),
}

/// Engine options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Keep compiled codecs between calls (default: true)
    pub cache_codecs: bool,

    /// Maximum record nesting per call (default: 128)
    pub max_depth: usize,

    /// Reject unknown input keys for record types that do not set their
    /// own policy (default: false)
    pub forbid_extra_keys: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_codecs: true,
            max_depth: 128,
            forbid_extra_keys: false,
        }
    }
}

impl EngineOptions {
    /// Unknown keys are errors, shallow nesting
    pub fn strict() -> Self {
        Self {
            cache_codecs: true,
            max_depth: 32,
            forbid_extra_keys: true,
        }
    }

    /// Unknown keys are ignored, deep nesting allowed
    pub fn permissive() -> Self {
        Self {
            cache_codecs: true,
            max_depth: 1024,
            forbid_extra_keys: false,
        }
    }

    /// Load options from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
        let options: EngineOptions =
            toml::from_str(text).map_err(|e| OptionsError::Parse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check that the options are usable
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.max_depth == 0 {
            return Err(OptionsError::Invalid(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
