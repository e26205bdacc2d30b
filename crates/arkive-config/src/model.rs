//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers produced by `loader.rs` once validation succeeds.
//! - Nothing here is mutated after construction; a run shares one snapshot.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Digest family requested by a format profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5 (128-bit digest).
    Md5,
    /// SHA-1 (160-bit digest).
    Sha1,
    /// SHA-2; the variant is chosen from the requested hash length.
    Sha2,
}

impl HashAlgorithm {
    /// Render the algorithm as its lowercase configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha2 => "sha2",
        }
    }

    /// Largest encoded hash length the algorithm can supply at 5 bits per character.
    #[must_use]
    pub const fn max_length(self) -> usize {
        let bits = match self {
            Self::Md5 => 128,
            Self::Sha1 => 160,
            Self::Sha2 => 512,
        };
        bits / 5
    }
}

impl FromStr for HashAlgorithm {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha2" => Ok(Self::Sha2),
            _ => Err(ConfigError::invalid(
                "profile",
                "hash-algorithm",
                Some(value.to_string()),
                "must be one of md5, sha1, sha2",
            )),
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Which of the two format profiles applies to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    /// Profile used when an embedded timestamp was resolved.
    Backup,
    /// Profile used when no timestamp is available.
    BackupNoTimestamp,
}

impl ProfileKind {
    /// Configuration section name for the profile.
    #[must_use]
    pub const fn section(self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::BackupNoTimestamp => "backup-no-timestamp",
        }
    }
}

/// Hash and filename settings applied to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatProfile {
    /// Destination filename template (without extension).
    pub filename_format: String,
    /// Digest family used to hash file content.
    pub hash_algorithm: HashAlgorithm,
    /// Number of characters kept from the encoded digest.
    pub hash_length: usize,
    /// When set, the pipeline computes destinations without writing anything.
    pub dry_run: bool,
}

/// Output format requested for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Human-readable output.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging preferences read from the `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Normalised level directive (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Requested output format; `None` lets the binary pick one.
    pub format: Option<LogFormatSetting>,
}

/// Validated configuration snapshot for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArkiveConfig {
    /// Root that relative destination paths are resolved against.
    pub destination: PathBuf,
    /// Number of worker threads archiving files.
    pub workers: usize,
    /// Source directory to source label.
    pub sources: BTreeMap<PathBuf, String>,
    /// Profile for files with an embedded timestamp.
    pub backup: FormatProfile,
    /// Profile for files without an embedded timestamp.
    pub backup_no_timestamp: FormatProfile,
    /// Lowercased raw extension to canonical extension.
    pub extension_map: BTreeMap<String, String>,
    /// Canonical extension to timestamp handler identifier.
    pub extension_handlers: BTreeMap<String, String>,
    /// Logging preferences.
    pub logging: LoggingSettings,
}

impl ArkiveConfig {
    /// Profile for the given kind.
    #[must_use]
    pub const fn profile(&self, kind: ProfileKind) -> &FormatProfile {
        match kind {
            ProfileKind::Backup => &self.backup,
            ProfileKind::BackupNoTimestamp => &self.backup_no_timestamp,
        }
    }
}
