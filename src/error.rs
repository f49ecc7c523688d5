//! Configuration errors
//!
//! The simulation step has no error path: degenerate geometry and stale
//! references are skipped for the tick. Only loading and validating
//! [`crate::Settings`] can fail.

use std::fmt;

/// Error raised while loading or validating settings
#[derive(Debug)]
pub enum ConfigError {
    /// Settings file could not be read
    Io(std::io::Error),
    /// Settings JSON was malformed or had the wrong shape
    Parse(serde_json::Error),
    /// A value parsed fine but is outside its usable range
    Invalid {
        /// Dotted path of the offending field (e.g. `field.spacing`)
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read settings: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to parse settings: {e}"),
            ConfigError::Invalid { field, reason } => {
                write!(f, "invalid setting `{field}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
