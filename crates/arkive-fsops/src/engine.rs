//! Archive engine: discovery, the per-file pipeline, and copy-if-absent.
//!
//! # Design
//! - Source directories are listed one level deep; only regular files (after
//!   following symlinks) are archived.
//! - Each file is independent: a failure is logged, recorded and the run continues.
//! - Copies are staged in the destination directory and moved into place
//!   without clobbering, so a destination is either absent or complete.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use arkive_config::{ArkiveConfig, ProfileKind};
use filetime::FileTime;
use tracing::{Span, debug, debug_span, error, info, info_span};
use uuid::Uuid;

use crate::error::{FsOpsError, FsOpsResult};
use crate::hasher::hash_path;
use crate::plan::ArchivePlan;
use crate::report::{ArchiveRecord, ArchiveReport, CopyOutcome, FileFailure};
use crate::template::synthesize;
use crate::timestamp::HandlerRegistry;

const STAGING_PREFIX: &str = ".arkive-";
const STAGING_SUFFIX: &str = ".partial";

/// A discovered file and the label of the directory it came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Source label.
    pub source: String,
    /// Path of the file inside the source directory.
    pub path: PathBuf,
}

/// Runs the archiving pipeline over every configured source.
#[derive(Debug, Clone)]
pub struct ArchiveEngine {
    plan: ArchivePlan,
}

impl ArchiveEngine {
    /// Engine over an already compiled plan.
    #[must_use]
    pub const fn new(plan: ArchivePlan) -> Self {
        Self { plan }
    }

    /// Compile `config` and build an engine.
    ///
    /// # Errors
    ///
    /// Returns the compilation error from [`ArchivePlan::compile`].
    pub fn from_config(config: &ArkiveConfig, registry: &HandlerRegistry) -> FsOpsResult<Self> {
        ArchivePlan::compile(config, registry).map(Self::new)
    }

    /// Compiled plan driving the engine.
    #[must_use]
    pub const fn plan(&self) -> &ArchivePlan {
        &self.plan
    }

    /// Archive every regular file in every source directory.
    #[must_use]
    pub fn archive_all(&self) -> ArchiveReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("archive_run", run_id = %run_id);
        let _entered = span.enter();
        info!(
            sources = self.plan.sources().len(),
            workers = self.plan.workers(),
            "archive run started"
        );

        let (files, mut failures) = self.discover();
        let mut records = Vec::with_capacity(files.len());
        for result in self.process(&files, &span) {
            match result {
                Ok(record) => records.push(record),
                Err(failure) => failures.push(failure),
            }
        }

        let report = ArchiveReport {
            run_id,
            records,
            failures,
        };
        info!(
            copied = report.count(CopyOutcome::Copied),
            already_present = report.count(CopyOutcome::AlreadyPresent),
            dry_run = report.count(CopyOutcome::DryRun),
            failed = report.failures.len(),
            "archive run finished"
        );
        report
    }

    /// List the files of every source directory.
    ///
    /// Directories that cannot be listed are returned as failures; the others
    /// are still listed.
    #[must_use]
    pub fn discover(&self) -> (Vec<SourceFile>, Vec<FileFailure>) {
        let mut files = Vec::new();
        let mut failures = Vec::new();
        for (directory, label) in self.plan.sources() {
            debug!(directory = %directory.display(), source = %label, "searching source directory");
            match list_regular_files(directory) {
                Ok(paths) => files.extend(paths.into_iter().map(|path| SourceFile {
                    source: label.clone(),
                    path,
                })),
                Err(err) => {
                    let detail = err.detail();
                    error!(
                        directory = %directory.display(),
                        source = %label,
                        error = %detail,
                        "failed to list source directory"
                    );
                    failures.push(FileFailure {
                        source: label.clone(),
                        path: directory.clone(),
                        destination: None,
                        message: detail,
                    });
                }
            }
        }
        (files, failures)
    }

    /// Run the full pipeline for one file.
    ///
    /// # Errors
    ///
    /// Returns a [`FileFailure`] describing the hashing, rendering or copy
    /// error. The failure has already been logged.
    pub fn archive_file(&self, file: &SourceFile) -> Result<ArchiveRecord, FileFailure> {
        let span = debug_span!("archive_file", source = %file.source, path = %file.path.display());
        let _entered = span.enter();

        let extension = self.plan.canonical_extension(&file.path);
        debug!(extension = %extension, "found file");
        let timestamp = self.plan.resolver().resolve(&extension, &file.path);
        let kind = if timestamp.is_some() {
            ProfileKind::Backup
        } else {
            ProfileKind::BackupNoTimestamp
        };
        let profile = self.plan.profile(kind);

        let hash = hash_path(profile.algorithm, profile.hash_length, &file.path)
            .map_err(|err| fail(file, None, &err))?;
        let rendered = synthesize(&profile.template, &file.source, timestamp, &hash, &extension)
            .map_err(|err| fail(file, None, &err))?;
        let destination = self.plan.destination_for(&rendered);
        let outcome = copy_if_absent(&file.path, &destination, profile.dry_run)
            .map_err(|err| fail(file, Some(&destination), &err))?;

        Ok(ArchiveRecord {
            source: file.source.clone(),
            source_path: file.path.clone(),
            extension,
            timestamp,
            profile: kind,
            hash,
            destination,
            outcome,
        })
    }

    fn process(
        &self,
        files: &[SourceFile],
        run_span: &Span,
    ) -> Vec<Result<ArchiveRecord, FileFailure>> {
        let workers = self.plan.workers().min(files.len());
        if workers <= 1 {
            return files.iter().map(|file| self.archive_file(file)).collect();
        }

        let cursor = AtomicUsize::new(0);
        let next = &cursor;
        let mut indexed: Vec<(usize, Result<ArchiveRecord, FileFailure>)> =
            thread::scope(|scope| {
                let handles: Vec<_> = (0..workers)
                    .map(|_| {
                        scope.spawn(move || {
                            let _entered = run_span.enter();
                            let mut done = Vec::new();
                            loop {
                                let index = next.fetch_add(1, Ordering::Relaxed);
                                let Some(file) = files.get(index) else {
                                    break;
                                };
                                done.push((index, self.archive_file(file)));
                            }
                            done
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|handle| match handle.join() {
                        Ok(done) => done,
                        Err(payload) => std::panic::resume_unwind(payload),
                    })
                    .collect()
            });
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }
}

fn fail(file: &SourceFile, destination: Option<&Path>, err: &FsOpsError) -> FileFailure {
    let detail = err.detail();
    error!(
        source = %file.source,
        path = %file.path.display(),
        destination = ?destination,
        error = %detail,
        "failed to archive file"
    );
    FileFailure {
        source: file.source.clone(),
        path: file.path.clone(),
        destination: destination.map(Path::to_path_buf),
        message: detail,
    }
}

/// Regular files directly inside `directory`, sorted by path.
///
/// Symlinks are followed; dangling links and anything that is not a regular
/// file are skipped.
///
/// # Errors
///
/// Returns `FsOpsError::Io` when the directory cannot be opened. Entries that
/// fail to read are skipped.
pub fn list_regular_files(directory: &Path) -> FsOpsResult<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)
        .map_err(|source| FsOpsError::io("discover.read_dir", directory, source))?;
    Ok(keep_regular_files(
        directory,
        entries.map(|entry| entry.map(|entry| entry.path())),
    ))
}

fn keep_regular_files(
    directory: &Path,
    entries: impl IntoIterator<Item = io::Result<PathBuf>>,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                debug!(directory = %directory.display(), error = %err, "skipping unlistable entry");
                continue;
            }
        };
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => debug!(path = %path.display(), "skipping non-file"),
            Err(err) => debug!(path = %path.display(), error = %err, "skipping unreadable entry"),
        }
    }
    files.sort();
    files
}

/// Copy `source` to `destination` unless something already exists there.
///
/// Any existing entry counts, including a dangling symlink. Content, access
/// and modification times, and permission bits are copied. In dry-run mode
/// nothing is created.
///
/// # Errors
///
/// Returns `FsOpsError::Io` when the destination cannot be inspected, its
/// directory cannot be created, or the copy fails.
pub fn copy_if_absent(source: &Path, destination: &Path, dry_run: bool) -> FsOpsResult<CopyOutcome> {
    match fs::symlink_metadata(destination) {
        Ok(_) => {
            debug!(
                path = %source.display(),
                destination = %destination.display(),
                "destination exists; not copying"
            );
            return Ok(CopyOutcome::AlreadyPresent);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(FsOpsError::io("copy.inspect", destination, err)),
    }

    if dry_run {
        info!(
            path = %source.display(),
            destination = %destination.display(),
            "dry run; would copy"
        );
        return Ok(CopyOutcome::DryRun);
    }

    debug!(path = %source.display(), destination = %destination.display(), "copying");
    let parent = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| FsOpsError::io("copy.create_dir", parent, err))?;

    let mut input = File::open(source).map_err(|err| FsOpsError::io("copy.open", source, err))?;
    let metadata = input
        .metadata()
        .map_err(|err| FsOpsError::io("copy.stat", source, err))?;

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(parent)
        .map_err(|err| FsOpsError::io("copy.stage", parent, err))?;
    io::copy(&mut input, staged.as_file_mut())
        .map_err(|err| FsOpsError::io("copy.write", staged.path(), err))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|err| FsOpsError::io("copy.sync", staged.path(), err))?;
    filetime::set_file_times(
        staged.path(),
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .map_err(|err| FsOpsError::io("copy.times", staged.path(), err))?;
    staged
        .as_file()
        .set_permissions(metadata.permissions())
        .map_err(|err| FsOpsError::io("copy.permissions", staged.path(), err))?;

    match staged.persist_noclobber(destination) {
        Ok(_) => {}
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
            debug!(
                destination = %destination.display(),
                "destination appeared while copying; discarding staged copy"
            );
            return Ok(CopyOutcome::AlreadyPresent);
        }
        Err(err) => return Err(FsOpsError::io("copy.persist", destination, err.error)),
    }

    // Best effort: not every filesystem supports syncing a directory handle.
    if let Err(err) = File::open(parent).and_then(|dir| dir.sync_all()) {
        debug!(directory = %parent.display(), error = %err, "directory sync skipped");
    }
    Ok(CopyOutcome::Copied)
}
