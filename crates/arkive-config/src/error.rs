//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a configuration file failed.
    #[error("failed to read configuration file '{}'", .path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// A configuration document was not valid TOML or did not match the schema.
    #[error("failed to parse configuration{}", describe_origin(.origin.as_ref()))]
    Parse {
        /// File the document came from; `None` for the built-in defaults.
        origin: Option<PathBuf>,
        /// Source TOML error.
        source: toml::de::Error,
    },
    /// The merged document could not be rendered back to TOML.
    #[error("failed to render configuration document")]
    Render {
        /// Source TOML error.
        source: toml::ser::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid value for '{field}' in '{section}': {reason}")]
    InvalidField {
        /// Section that failed validation.
        section: String,
        /// Field that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        section: impl Into<String>,
        field: impl Into<String>,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section: section.into(),
            field: field.into(),
            value,
            reason,
        }
    }
}

fn describe_origin(origin: Option<&PathBuf>) -> String {
    origin.map_or_else(
        || " defaults".to_string(),
        |path| format!(" file '{}'", path.display()),
    )
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
