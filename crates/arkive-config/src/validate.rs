//! Validation helpers and parsing utilities for configuration documents.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    ArkiveConfig, FormatProfile, HashAlgorithm, LogFormatSetting, LoggingSettings, ProfileKind,
};

/// Untyped view of the merged document, mirroring its table layout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct RawConfig {
    destination: PathBuf,
    workers: i64,
    #[serde(default)]
    sources: BTreeMap<String, String>,
    backup: RawProfile,
    backup_no_timestamp: RawProfile,
    #[serde(default)]
    extension_map: BTreeMap<String, String>,
    #[serde(default)]
    extension_handlers: BTreeMap<String, String>,
    logging: RawLogging,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawProfile {
    filename_format: String,
    hash_algorithm: String,
    hash_length: i64,
    #[serde(default)]
    dry_run: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawLogging {
    level: String,
    format: Option<LogFormatSetting>,
}

impl RawConfig {
    /// Validate every field and produce the typed snapshot.
    pub(crate) fn into_config(self) -> ConfigResult<ArkiveConfig> {
        let sources = self
            .sources
            .into_iter()
            .map(|(directory, label)| {
                if directory.trim().is_empty() {
                    return Err(ConfigError::invalid(
                        "sources",
                        directory,
                        None,
                        "source directory must not be empty",
                    ));
                }
                Ok((PathBuf::from(directory), label))
            })
            .collect::<ConfigResult<BTreeMap<_, _>>>()?;

        Ok(ArkiveConfig {
            destination: self.destination,
            workers: parse_workers(self.workers)?,
            sources,
            backup: self.backup.into_profile(ProfileKind::Backup)?,
            backup_no_timestamp: self
                .backup_no_timestamp
                .into_profile(ProfileKind::BackupNoTimestamp)?,
            extension_map: normalize_extension_table("extension-map", self.extension_map, true)?,
            extension_handlers: normalize_extension_table(
                "extension-handlers",
                self.extension_handlers,
                false,
            )?,
            logging: LoggingSettings {
                level: parse_log_level(&self.logging.level)?,
                format: self.logging.format,
            },
        })
    }
}

impl RawProfile {
    fn into_profile(self, kind: ProfileKind) -> ConfigResult<FormatProfile> {
        let section = kind.section();
        let hash_algorithm =
            parse_hash_algorithm(&self.hash_algorithm).map_err(|err| match err {
                ConfigError::InvalidField {
                    field,
                    value,
                    reason,
                    ..
                } => ConfigError::invalid(section, field, value, reason),
                other => other,
            })?;
        let hash_length = parse_hash_length(section, hash_algorithm, self.hash_length)?;
        if self.filename_format.trim().is_empty() {
            return Err(ConfigError::invalid(
                section,
                "filename-format",
                None,
                "must not be empty",
            ));
        }
        Ok(FormatProfile {
            filename_format: self.filename_format,
            hash_algorithm,
            hash_length,
            dry_run: self.dry_run,
        })
    }
}

/// Parse a hash algorithm name, ignoring case.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` for names other than `md5`, `sha1`, `sha2`.
pub fn parse_hash_algorithm(value: &str) -> ConfigResult<HashAlgorithm> {
    value.trim().parse()
}

/// Validate a requested hash length against what the algorithm can supply.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the length is not positive or
/// exceeds [`HashAlgorithm::max_length`].
pub fn parse_hash_length(
    section: &str,
    algorithm: HashAlgorithm,
    value: i64,
) -> ConfigResult<usize> {
    let length = usize::try_from(value)
        .ok()
        .filter(|length| *length > 0)
        .ok_or_else(|| {
            ConfigError::invalid(
                section,
                "hash-length",
                Some(value.to_string()),
                "must be a positive integer",
            )
        })?;
    if length > algorithm.max_length() {
        return Err(ConfigError::invalid(
            section,
            "hash-length",
            Some(value.to_string()),
            "exceeds the digest width of the selected hash-algorithm",
        ));
    }
    Ok(length)
}

/// Validate the worker count.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the count is not positive.
pub fn parse_workers(value: i64) -> ConfigResult<usize> {
    usize::try_from(value)
        .ok()
        .filter(|workers| *workers > 0)
        .ok_or_else(|| {
            ConfigError::invalid(
                "root",
                "workers",
                Some(value.to_string()),
                "must be a positive integer",
            )
        })
}

/// Normalise a log level name into a `tracing` directive.
///
/// Accepts the conventional names in any case, plus `warning`, `critical`
/// and `fatal` as aliases.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` for unrecognised names.
pub fn parse_log_level(value: &str) -> ConfigResult<String> {
    let level = match value.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        _ => {
            return Err(ConfigError::invalid(
                "logging",
                "level",
                Some(value.to_string()),
                "must be one of trace, debug, info, warn, warning, error, critical, fatal",
            ));
        }
    };
    Ok(level.to_string())
}

fn normalize_extension_table(
    section: &'static str,
    table: BTreeMap<String, String>,
    lowercase_values: bool,
) -> ConfigResult<BTreeMap<String, String>> {
    let mut normalized = BTreeMap::new();
    for (key, value) in table {
        let extension = key.trim().trim_start_matches('.').to_lowercase();
        if extension.is_empty() {
            return Err(ConfigError::invalid(
                section,
                key,
                Some(value),
                "extension keys must not be empty",
            ));
        }
        let value = if lowercase_values {
            value.trim().trim_start_matches('.').to_lowercase()
        } else {
            value.trim().to_string()
        };
        if normalized.insert(extension, value).is_some() {
            return Err(ConfigError::invalid(
                section,
                key,
                None,
                "extension listed more than once after lowercasing",
            ));
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_length_must_be_positive() {
        for value in [0, -3] {
            let err = parse_hash_length("backup", HashAlgorithm::Md5, value);
            assert!(matches!(
                err,
                Err(ConfigError::InvalidField { reason, .. }) if reason == "must be a positive integer"
            ));
        }
    }

    #[test]
    fn hash_length_is_bounded_by_digest_width() {
        assert_eq!(parse_hash_length("backup", HashAlgorithm::Md5, 25).ok(), Some(25));
        assert!(parse_hash_length("backup", HashAlgorithm::Md5, 26).is_err());
        assert_eq!(parse_hash_length("backup", HashAlgorithm::Sha1, 32).ok(), Some(32));
        assert!(parse_hash_length("backup", HashAlgorithm::Sha1, 33).is_err());
        assert_eq!(parse_hash_length("backup", HashAlgorithm::Sha2, 102).ok(), Some(102));
        assert!(parse_hash_length("backup", HashAlgorithm::Sha2, 103).is_err());
    }

    #[test]
    fn log_levels_accept_aliases() -> ConfigResult<()> {
        assert_eq!(parse_log_level("DEBUG")?, "debug");
        assert_eq!(parse_log_level("Warning")?, "warn");
        assert_eq!(parse_log_level("CRITICAL")?, "error");
        assert_eq!(parse_log_level("fatal")?, "error");
        assert!(parse_log_level("loud").is_err());
        Ok(())
    }

    #[test]
    fn extension_tables_are_lowercased() -> ConfigResult<()> {
        let table = BTreeMap::from([
            ("JPEG".to_string(), "JPG".to_string()),
            (".Htm".to_string(), "html".to_string()),
        ]);
        let normalized = normalize_extension_table("extension-map", table, true)?;
        assert_eq!(normalized.get("jpeg").map(String::as_str), Some("jpg"));
        assert_eq!(normalized.get("htm").map(String::as_str), Some("html"));
        Ok(())
    }

    #[test]
    fn duplicate_extensions_after_lowercasing_are_rejected() {
        let table = BTreeMap::from([
            ("jpeg".to_string(), "jpg".to_string()),
            ("JPEG".to_string(), "jpg".to_string()),
        ]);
        assert!(normalize_extension_table("extension-map", table, true).is_err());
    }

    #[test]
    fn workers_must_be_positive() {
        assert_eq!(parse_workers(4).ok(), Some(4));
        assert!(parse_workers(0).is_err());
    }
}
