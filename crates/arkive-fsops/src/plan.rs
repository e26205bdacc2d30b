//! Validated, compiled form of the configuration used by a run.
//!
//! # Design
//! - Everything that can be rejected is rejected here, before any file is touched.
//! - The plan is immutable and shared by reference across worker threads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use arkive_config::{ArkiveConfig, FormatProfile, HashAlgorithm, ProfileKind};

use crate::error::{FsOpsError, FsOpsResult};
use crate::template::FilenameTemplate;
use crate::timestamp::{HandlerRegistry, TimestampResolver};

/// Format profile with its template compiled.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    /// Which profile this is.
    pub kind: ProfileKind,
    /// Destination template, without extension.
    pub template: FilenameTemplate,
    /// Digest family.
    pub algorithm: HashAlgorithm,
    /// Encoded hash length in characters.
    pub hash_length: usize,
    /// Compute destinations without writing.
    pub dry_run: bool,
}

impl CompiledProfile {
    fn compile(kind: ProfileKind, profile: &FormatProfile) -> FsOpsResult<Self> {
        let max_length = profile.hash_algorithm.max_length();
        if profile.hash_length == 0 || profile.hash_length > max_length {
            return Err(FsOpsError::InvalidInput {
                field: "hash-length",
                reason: "must be between 1 and the algorithm's maximum",
                value: Some(format!(
                    "{} ({} allows {max_length})",
                    profile.hash_length, profile.hash_algorithm
                )),
            });
        }
        let template = FilenameTemplate::parse(&profile.filename_format)?;
        if kind == ProfileKind::BackupNoTimestamp && template.uses_timestamp() {
            return Err(FsOpsError::template(
                template.as_str(),
                "profile without a timestamp cannot reference it",
                Some("timestamp".to_string()),
            ));
        }
        Ok(Self {
            kind,
            template,
            algorithm: profile.hash_algorithm,
            hash_length: profile.hash_length,
            dry_run: profile.dry_run,
        })
    }
}

/// Everything a run needs, compiled from configuration.
#[derive(Debug, Clone)]
pub struct ArchivePlan {
    destination: PathBuf,
    workers: usize,
    sources: Vec<(PathBuf, String)>,
    extension_map: BTreeMap<String, String>,
    resolver: TimestampResolver,
    backup: CompiledProfile,
    backup_no_timestamp: CompiledProfile,
}

impl ArchivePlan {
    /// Compile configuration against the available timestamp handlers.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid templates, out-of-range hash lengths, a
    /// zero worker count, or extensions bound to unknown handlers.
    pub fn compile(config: &ArkiveConfig, registry: &HandlerRegistry) -> FsOpsResult<Self> {
        if config.workers == 0 {
            return Err(FsOpsError::InvalidInput {
                field: "workers",
                reason: "must be positive",
                value: Some("0".to_string()),
            });
        }
        let extension_map = config
            .extension_map
            .iter()
            .map(|(raw, canonical)| (raw.to_lowercase(), canonical.clone()))
            .collect();
        Ok(Self {
            destination: config.destination.clone(),
            workers: config.workers,
            sources: config
                .sources
                .iter()
                .map(|(directory, label)| (directory.clone(), label.clone()))
                .collect(),
            extension_map,
            resolver: TimestampResolver::new(&config.extension_handlers, registry)?,
            backup: CompiledProfile::compile(ProfileKind::Backup, &config.backup)?,
            backup_no_timestamp: CompiledProfile::compile(
                ProfileKind::BackupNoTimestamp,
                &config.backup_no_timestamp,
            )?,
        })
    }

    /// Root that relative destinations are joined onto.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Source directories and their labels, in directory order.
    #[must_use]
    pub fn sources(&self) -> &[(PathBuf, String)] {
        &self.sources
    }

    /// Timestamp dispatch table.
    #[must_use]
    pub const fn resolver(&self) -> &TimestampResolver {
        &self.resolver
    }

    /// Compiled profile of the given kind.
    #[must_use]
    pub const fn profile(&self, kind: ProfileKind) -> &CompiledProfile {
        match kind {
            ProfileKind::Backup => &self.backup,
            ProfileKind::BackupNoTimestamp => &self.backup_no_timestamp,
        }
    }

    /// Canonical extension of `path`.
    ///
    /// The text after the last `.` of the file name, lowercased and passed
    /// through the extension map. Names without a dot, or whose only dot is
    /// leading, have an empty extension.
    #[must_use]
    pub fn canonical_extension(&self, path: &Path) -> String {
        let raw = path
            .extension()
            .map(|extension| extension.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.extension_map.get(&raw).cloned().unwrap_or(raw)
    }

    /// Join a rendered template onto the destination root.
    #[must_use]
    pub fn destination_for(&self, rendered: &str) -> PathBuf {
        self.destination.join(rendered)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;
    use arkive_config::{LoadOptions, load_config};

    type TestResult<T> = Result<T>;

    /// Configuration built from the defaults and an empty file.
    pub(crate) fn default_config() -> TestResult<ArkiveConfig> {
        let file = tempfile::Builder::new()
            .prefix("arkive-plan-")
            .suffix(".toml")
            .tempfile()?;
        let loaded = load_config(&LoadOptions {
            config_file: Some(file.path().to_path_buf()),
            overrides: Vec::new(),
        })?;
        Ok(loaded.config)
    }

    fn plan_with(extension_map: &[(&str, &str)]) -> TestResult<ArchivePlan> {
        let mut config = default_config()?;
        config.extension_map = extension_map
            .iter()
            .map(|(raw, canonical)| ((*raw).to_string(), (*canonical).to_string()))
            .collect();
        Ok(ArchivePlan::compile(&config, &HandlerRegistry::builtin())?)
    }

    #[test]
    fn extensions_are_mapped_case_insensitively() -> TestResult<()> {
        let plan = plan_with(&[("jpeg", "jpg"), ("htm", "html")])?;
        let cases = [
            ("a/b/c/whatever.png", "png"),
            ("stuff.tar", "tar"),
            ("blah.jpeg", "jpg"),
            ("bleh.jpg", "jpg"),
            ("jkl/x123.htm", "html"),
            ("jkl/x123.html", "html"),
            ("a/b/c/whatever.PNG", "png"),
            ("stuff.Tar", "tar"),
            ("blah.Jpeg", "jpg"),
            ("a.JPEG", "jpg"),
            ("bleh.JPG", "jpg"),
            ("jkl/x123.HTM", "html"),
            ("jkl/x123.hTmL", "html"),
        ];
        for (path, expected) in cases {
            assert_eq!(plan.canonical_extension(Path::new(path)), expected, "{path}");
        }
        Ok(())
    }

    #[test]
    fn names_without_extension_map_to_empty() -> TestResult<()> {
        let plan = plan_with(&[])?;
        assert_eq!(plan.canonical_extension(Path::new("README")), "");
        assert_eq!(plan.canonical_extension(Path::new("dir/.bashrc")), "");
        assert_eq!(plan.canonical_extension(Path::new("archive.tar.gz")), "gz");
        Ok(())
    }

    #[test]
    fn timestamp_in_fallback_template_is_rejected() -> TestResult<()> {
        let mut config = default_config()?;
        config.backup_no_timestamp.filename_format = "{source}/{timestamp}".to_string();
        let result = ArchivePlan::compile(&config, &HandlerRegistry::builtin());
        assert!(matches!(
            result,
            Err(FsOpsError::InvalidTemplate {
                reason: "profile without a timestamp cannot reference it",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn timezone_directives_fail_at_compile_time() -> TestResult<()> {
        let mut config = default_config()?;
        config.backup.filename_format = "{source}/{timestamp:%Y%z}-{hash}".to_string();
        let result = ArchivePlan::compile(&config, &HandlerRegistry::builtin());
        assert!(matches!(
            result,
            Err(FsOpsError::InvalidTemplate {
                reason: "invalid strftime format",
                value: Some(ref spec),
                ..
            }) if spec == "%Y%z"
        ));
        Ok(())
    }

    #[test]
    fn unbound_handler_and_bad_lengths_are_rejected() -> TestResult<()> {
        let mut config = default_config()?;
        config
            .extension_handlers
            .insert("png".to_string(), "xmp".to_string());
        assert!(matches!(
            ArchivePlan::compile(&config, &HandlerRegistry::builtin()),
            Err(FsOpsError::UnknownHandler { .. })
        ));

        let mut config = default_config()?;
        config.backup.hash_length = 26;
        assert!(matches!(
            ArchivePlan::compile(&config, &HandlerRegistry::builtin()),
            Err(FsOpsError::InvalidInput { field: "hash-length", .. })
        ));

        let mut config = default_config()?;
        config.workers = 0;
        assert!(matches!(
            ArchivePlan::compile(&config, &HandlerRegistry::builtin()),
            Err(FsOpsError::InvalidInput { field: "workers", .. })
        ));
        Ok(())
    }

    #[test]
    fn default_plan_exposes_profiles_and_destination() -> TestResult<()> {
        let plan = ArchivePlan::compile(&default_config()?, &HandlerRegistry::builtin())?;
        assert_eq!(plan.workers(), 1);
        assert!(plan.sources().is_empty());
        assert_eq!(plan.profile(ProfileKind::Backup).hash_length, 8);
        assert_eq!(plan.profile(ProfileKind::BackupNoTimestamp).hash_length, 16);
        assert_eq!(plan.resolver().handler_for("jpg"), Some("exif"));
        assert_eq!(
            plan.destination_for("phone/unknown/x.png"),
            Path::new(".").join("phone/unknown/x.png")
        );
        Ok(())
    }
}
