//! Configuration loading: defaults, file overlay, command-line overrides.
//!
//! # Design
//! - Merge at the document level (`toml::Table`) so a file only needs the keys it changes.
//! - Overrides are applied to the merged document before validation, so
//!   `--debug-config` shows exactly what a run would use.
//! - A missing default file is tolerated; a missing explicit file is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::debug;

use crate::defaults::{DEFAULT_CONFIG_FILE, DEFAULT_DOCUMENT};
use crate::error::{ConfigError, ConfigResult};
use crate::model::ArkiveConfig;
use crate::validate::RawConfig;

/// Single value forced onto the merged document.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOverride {
    /// Table the key lives in; `None` for top-level keys.
    pub section: Option<&'static str>,
    /// Key inside the table.
    pub key: &'static str,
    /// Replacement value.
    pub value: Value,
}

impl ConfigOverride {
    /// Override a key inside a table.
    #[must_use]
    pub fn section(section: &'static str, key: &'static str, value: impl Into<Value>) -> Self {
        Self {
            section: Some(section),
            key,
            value: value.into(),
        }
    }

    /// Override a top-level key.
    #[must_use]
    pub fn root(key: &'static str, value: impl Into<Value>) -> Self {
        Self {
            section: None,
            key,
            value: value.into(),
        }
    }

    fn apply(&self, document: &mut Table) {
        let target = match self.section {
            Some(section) => {
                let entry = document
                    .entry(section.to_string())
                    .or_insert_with(|| Value::Table(Table::new()));
                if !entry.is_table() {
                    *entry = Value::Table(Table::new());
                }
                match entry {
                    Value::Table(table) => table,
                    _ => return,
                }
            }
            None => document,
        };
        target.insert(self.key.to_string(), self.value.clone());
    }
}

/// Inputs controlling where configuration comes from.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit configuration file; `None` consults [`DEFAULT_CONFIG_FILE`].
    pub config_file: Option<PathBuf>,
    /// Values applied after the file, in order.
    pub overrides: Vec<ConfigOverride>,
}

/// Merged document together with its validated form.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Defaults, file and overrides merged into one document.
    pub document: Table,
    /// Typed configuration derived from `document`.
    pub config: ArkiveConfig,
}

impl LoadedConfig {
    /// Render the merged document as TOML.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Render` if serialisation fails.
    pub fn render(&self) -> ConfigResult<String> {
        toml::to_string_pretty(&self.document).map_err(|source| ConfigError::Render { source })
    }
}

/// Load, merge and validate configuration.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or when any
/// field fails validation.
pub fn load_config(options: &LoadOptions) -> ConfigResult<LoadedConfig> {
    let mut document = parse_document(DEFAULT_DOCUMENT, None)?;

    let (path, required) = options.config_file.as_ref().map_or_else(
        || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        |path| (path.clone(), true),
    );
    if let Some(overlay) = read_document(&path, required)? {
        debug!(path = %path.display(), "merging configuration file");
        merge_tables(&mut document, overlay);
    } else {
        debug!(path = %path.display(), "configuration file not found; using defaults");
    }

    for item in &options.overrides {
        item.apply(&mut document);
    }

    let config = from_document(&document)?;
    Ok(LoadedConfig { document, config })
}

/// Validate an already-merged document.
///
/// # Errors
///
/// Returns an error when the document does not match the schema or a field
/// fails validation.
pub fn from_document(document: &Table) -> ConfigResult<ArkiveConfig> {
    let raw: RawConfig = Value::Table(document.clone())
        .try_into()
        .map_err(|source| ConfigError::Parse {
            origin: None,
            source,
        })?;
    raw.into_config()
}

/// Deep-merge `overlay` onto `base`: tables merge key by key, everything else replaces.
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        let Value::Table(incoming) = value else {
            base.insert(key, value);
            continue;
        };
        if let Some(Value::Table(existing)) = base.get_mut(&key) {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key, Value::Table(incoming));
    }
}

fn read_document(path: &Path, required: bool) -> ConfigResult<Option<Table>> {
    match fs::read_to_string(path) {
        Ok(content) => parse_document(&content, Some(path)).map(Some),
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_document(content: &str, origin: Option<&Path>) -> ConfigResult<Table> {
    content.parse::<Table>().map_err(|source| ConfigError::Parse {
        origin: origin.map(Path::to_path_buf),
        source,
    })
}
