//! # Design
//!
//! - Provide structured, constant-message errors for the archiving pipeline.
//! - Capture operation context (paths, fields, inputs) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for archiving operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by the archiving pipeline.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Filename template failed to compile or render.
    #[error("fsops invalid template")]
    InvalidTemplate {
        /// Template text that failed.
        template: String,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending fragment when available.
        value: Option<String>,
    },
    /// An extension is bound to a timestamp handler that is not registered.
    #[error("fsops unknown timestamp handler")]
    UnknownHandler {
        /// Canonical extension carrying the binding.
        extension: String,
        /// Handler identifier that could not be resolved.
        handler: String,
    },
    /// Input validation failures.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// A template referenced the timestamp but none was resolved for the file.
    #[error("fsops missing timestamp")]
    MissingTimestamp {
        /// Template that required the timestamp.
        template: String,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn template(template: &str, reason: &'static str, value: Option<String>) -> Self {
        Self::InvalidTemplate {
            template: template.to_string(),
            reason,
            value,
        }
    }

    /// Render the error with its context and source chain on one line.
    #[must_use]
    pub fn detail(&self) -> String {
        let mut detail = match self {
            Self::Io {
                operation, path, ..
            } => format!("{self} during {operation} on '{}'", path.display()),
            Self::InvalidTemplate {
                template,
                reason,
                value,
            } => match value {
                Some(value) => format!("{self}: {reason} ('{value}' in '{template}')"),
                None => format!("{self}: {reason} (in '{template}')"),
            },
            Self::UnknownHandler { extension, handler } => {
                format!("{self}: '{handler}' bound to extension '{extension}'")
            }
            Self::InvalidInput {
                field,
                reason,
                value,
            } => match value {
                Some(value) => format!("{self}: {field} {reason} (got '{value}')"),
                None => format!("{self}: {field} {reason}"),
            },
            Self::MissingTimestamp { template } => {
                format!("{self}: template '{template}' needs a timestamp")
            }
        };
        let mut source = self.source();
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fsops_error_helpers_build_variants() {
        let io_err = FsOpsError::io("hash.open", "photo.jpg", io::Error::other("denied"));
        assert!(matches!(io_err, FsOpsError::Io { .. }));
        assert!(io_err.source().is_some());
        assert_eq!(
            io_err.detail(),
            "fsops io failure during hash.open on 'photo.jpg': denied"
        );

        let template_err = FsOpsError::template("{nope}", "unknown placeholder", Some("nope".into()));
        assert!(matches!(template_err, FsOpsError::InvalidTemplate { .. }));
        assert!(template_err.source().is_none());
        assert!(template_err.detail().contains("unknown placeholder"));
    }

    #[test]
    fn unknown_handler_detail_names_binding() {
        let err = FsOpsError::UnknownHandler {
            extension: "png".to_string(),
            handler: "xmp".to_string(),
        };
        assert_eq!(
            err.detail(),
            "fsops unknown timestamp handler: 'xmp' bound to extension 'png'"
        );
    }
}
