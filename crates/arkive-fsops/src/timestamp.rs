//! Embedded capture-timestamp extraction.
//!
//! # Design
//! - Extractors are capabilities keyed by identifier in a registry built at startup.
//! - Extraction never fails outward: problems are logged here and become `None`.
//! - Bindings from extension to handler are checked once, when the resolver is built.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use exif::{In, Tag, Value};
use tracing::{debug, error};

use crate::error::{FsOpsError, FsOpsResult};

/// Identifier of the built-in EXIF handler.
pub const EXIF_HANDLER: &str = "exif";

/// Textual layout of EXIF date-time values.
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Capability that reads an embedded capture timestamp from a file.
pub trait TimestampExtractor: Send + Sync {
    /// Return the capture timestamp, or `None` when the file has none or it cannot be read.
    fn extract(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Reads `DateTimeOriginal` from EXIF metadata in JPEG, TIFF and similar containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtractor;

impl TimestampExtractor for ExifExtractor {
    fn extract(&self, path: &Path) -> Option<NaiveDateTime> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to open file for exif");
                return None;
            }
        };
        let metadata = match exif::Reader::new().read_from_container(&mut BufReader::new(file)) {
            Ok(metadata) => metadata,
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to read exif metadata");
                return None;
            }
        };
        let Some(field) = metadata.get_field(Tag::DateTimeOriginal, In::PRIMARY) else {
            error!(path = %path.display(), "exif metadata has no DateTimeOriginal");
            return None;
        };
        let raw = match &field.value {
            Value::Ascii(values) => values.first().map(|value| String::from_utf8_lossy(value)),
            _ => None,
        };
        let Some(raw) = raw else {
            error!(path = %path.display(), "exif DateTimeOriginal is not text");
            return None;
        };
        let parsed = parse_exif_datetime(&raw);
        if parsed.is_none() {
            error!(path = %path.display(), value = %raw, "invalid exif datetime");
        }
        parsed
    }
}

/// Parse an EXIF `YYYY:MM:DD HH:MM:SS` value.
#[must_use]
pub fn parse_exif_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT).ok()
}

/// Extractors available to a run, keyed by handler identifier.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn TimestampExtractor>>,
}

impl HandlerRegistry {
    /// Registry holding only the built-in handlers.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(EXIF_HANDLER, ExifExtractor);
        registry
    }

    /// Add or replace a handler.
    pub fn register(
        &mut self,
        identifier: impl Into<String>,
        extractor: impl TimestampExtractor + 'static,
    ) -> &mut Self {
        self.handlers.insert(identifier.into(), Arc::new(extractor));
        self
    }

    /// Look up a handler by identifier.
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<Arc<dyn TimestampExtractor>> {
        self.handlers.get(identifier).cloned()
    }

    /// Registered identifiers in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Dispatches canonical extensions to their bound extractor.
#[derive(Clone)]
pub struct TimestampResolver {
    bindings: BTreeMap<String, (String, Arc<dyn TimestampExtractor>)>,
}

impl TimestampResolver {
    /// Bind each extension to its registered handler.
    ///
    /// # Errors
    ///
    /// Returns `FsOpsError::UnknownHandler` when an extension names a handler
    /// the registry does not contain.
    pub fn new(
        extension_handlers: &BTreeMap<String, String>,
        registry: &HandlerRegistry,
    ) -> FsOpsResult<Self> {
        let mut bindings = BTreeMap::new();
        for (extension, handler) in extension_handlers {
            let extractor = registry
                .get(handler)
                .ok_or_else(|| FsOpsError::UnknownHandler {
                    extension: extension.clone(),
                    handler: handler.clone(),
                })?;
            bindings.insert(extension.clone(), (handler.clone(), extractor));
        }
        Ok(Self { bindings })
    }

    /// Resolve the timestamp of `path` through the handler bound to `extension`.
    ///
    /// Extensions without a binding resolve to `None`.
    #[must_use]
    pub fn resolve(&self, extension: &str, path: &Path) -> Option<NaiveDateTime> {
        let (handler, extractor) = self.bindings.get(extension)?;
        let timestamp = extractor.extract(path);
        debug!(
            path = %path.display(),
            handler = %handler,
            found = timestamp.is_some(),
            "timestamp lookup"
        );
        timestamp
    }

    /// Handler identifier bound to `extension`, if any.
    #[must_use]
    pub fn handler_for(&self, extension: &str) -> Option<&str> {
        self.bindings
            .get(extension)
            .map(|(handler, _)| handler.as_str())
    }
}

impl fmt::Debug for TimestampResolver {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings: BTreeMap<&str, &str> = self
            .bindings
            .iter()
            .map(|(extension, (handler, _))| (extension.as_str(), handler.as_str()))
            .collect();
        formatter
            .debug_struct("TimestampResolver")
            .field("bindings", &bindings)
            .finish()
    }
}
