//! Per-run results returned to callers.

use std::path::PathBuf;

use arkive_config::ProfileKind;
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

/// What the copy step did for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyOutcome {
    /// The file was written to its destination.
    Copied,
    /// Something already existed at the destination; nothing was written.
    AlreadyPresent,
    /// The profile is in dry-run mode; nothing was written.
    DryRun,
}

impl CopyOutcome {
    /// Stable label used in summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Copied => "copied",
            Self::AlreadyPresent => "already-present",
            Self::DryRun => "dry-run",
        }
    }
}

/// Decision made for a single archived file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveRecord {
    /// Label of the source directory.
    pub source: String,
    /// File that was archived.
    pub source_path: PathBuf,
    /// Canonical extension; empty when the file has none.
    pub extension: String,
    /// Embedded capture timestamp, when one was found.
    pub timestamp: Option<NaiveDateTime>,
    /// Profile applied to the file.
    pub profile: ProfileKind,
    /// Encoded content hash.
    pub hash: String,
    /// Destination path.
    pub destination: PathBuf,
    /// Copy step result.
    pub outcome: CopyOutcome,
}

/// A file or directory that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Label of the source directory.
    pub source: String,
    /// File or directory that failed.
    pub path: PathBuf,
    /// Destination being written when the failure happened, if known.
    pub destination: Option<PathBuf>,
    /// Error detail including its cause chain.
    pub message: String,
}

/// Everything one run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
    /// Identifier attached to the run's tracing span.
    pub run_id: Uuid,
    /// Files that completed, in discovery order.
    pub records: Vec<ArchiveRecord>,
    /// Files and directories that failed.
    pub failures: Vec<FileFailure>,
}

impl ArchiveReport {
    /// Number of records with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: CopyOutcome) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome == outcome)
            .count()
    }

    /// Whether the run finished without failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, outcome: CopyOutcome) -> ArchiveRecord {
        ArchiveRecord {
            source: "phone".to_string(),
            source_path: PathBuf::from(format!("/in/{name}")),
            extension: "jpg".to_string(),
            timestamp: None,
            profile: ProfileKind::BackupNoTimestamp,
            hash: "abcd".to_string(),
            destination: PathBuf::from(format!("/out/{name}")),
            outcome,
        }
    }

    #[test]
    fn counts_outcomes_and_failures() {
        let mut report = ArchiveReport {
            run_id: Uuid::nil(),
            records: vec![
                record("a", CopyOutcome::Copied),
                record("b", CopyOutcome::Copied),
                record("c", CopyOutcome::AlreadyPresent),
            ],
            failures: Vec::new(),
        };
        assert_eq!(report.count(CopyOutcome::Copied), 2);
        assert_eq!(report.count(CopyOutcome::AlreadyPresent), 1);
        assert_eq!(report.count(CopyOutcome::DryRun), 0);
        assert!(report.is_success());

        report.failures.push(FileFailure {
            source: "phone".to_string(),
            path: PathBuf::from("/in/d"),
            destination: None,
            message: "fsops io failure".to_string(),
        });
        assert!(!report.is_success());
    }

    #[test]
    fn serializes_kebab_case_labels() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(record("a", CopyOutcome::AlreadyPresent))?;
        assert_eq!(value["outcome"], "already-present");
        assert_eq!(value["profile"], "backup-no-timestamp");
        assert_eq!(value["timestamp"], serde_json::Value::Null);
        Ok(())
    }
}
