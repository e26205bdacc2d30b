use std::fs;
use std::path::Path;

use arkive_config::{ConfigOverride, LoadOptions, ProfileKind, load_config};
use arkive_fsops::fixtures::jpeg_with_datetime;
use arkive_fsops::{ArchiveEngine, CopyOutcome, HandlerRegistry, encode_hash};

type TestResult<T> = anyhow::Result<T>;

fn write_config(dir: &Path, source: &Path, destination: &Path) -> TestResult<std::path::PathBuf> {
    let path = dir.join("arkive.toml");
    fs::write(
        &path,
        format!(
            "destination = {destination:?}\n\n[sources]\n{source:?} = \"phone\"\n",
            destination = destination.display().to_string(),
            source = source.display().to_string(),
        ),
    )?;
    Ok(path)
}

#[test]
fn default_layout_sorts_photos_by_capture_time() -> TestResult<()> {
    let dir = tempfile::Builder::new()
        .prefix("arkive-pipeline-")
        .tempdir()?;
    let source = dir.path().join("camera");
    let destination = dir.path().join("archive");
    fs::create_dir_all(&source)?;
    let photo = jpeg_with_datetime(b"2016:05:04 03:02:01");
    fs::write(source.join("IMG_0001.JPEG"), &photo)?;
    fs::write(source.join("IMG_0002.jpg"), jpeg_with_datetime(b"0000:00:00 00:00:00"))?;
    fs::write(source.join("notes"), b"no extension")?;

    let config_file = write_config(dir.path(), &source, &destination)?;
    let loaded = load_config(&LoadOptions {
        config_file: Some(config_file),
        overrides: Vec::new(),
    })?;
    let engine = ArchiveEngine::from_config(&loaded.config, &HandlerRegistry::builtin())?;
    let report = engine.archive_all();

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.count(CopyOutcome::Copied), 3);

    let dated = encode_hash(&md5::compute(&photo).0, 8)?;
    let dated_path = destination.join(format!("phone/2016-05/phone-20160504_030201-{dated}.jpg"));
    assert_eq!(fs::read(&dated_path)?, photo);
    assert_eq!(report.records[0].profile, ProfileKind::Backup);

    // A zeroed capture time cannot be parsed and falls back to the undated layout.
    assert_eq!(report.records[1].profile, ProfileKind::BackupNoTimestamp);
    assert!(
        report.records[1]
            .destination
            .starts_with(destination.join("phone/unknown"))
    );

    let plain = encode_hash(&md5::compute(b"no extension").0, 16)?;
    assert!(destination.join(format!("phone/unknown/phone-{plain}")).is_file());
    Ok(())
}

#[test]
fn dry_run_override_leaves_destination_untouched() -> TestResult<()> {
    let dir = tempfile::Builder::new()
        .prefix("arkive-pipeline-")
        .tempdir()?;
    let source = dir.path().join("camera");
    let destination = dir.path().join("archive");
    fs::create_dir_all(&source)?;
    fs::write(source.join("IMG_0001.jpg"), jpeg_with_datetime(b"2016:05:04 03:02:01"))?;
    fs::write(source.join("clip.mov"), b"movie")?;

    let config_file = write_config(dir.path(), &source, &destination)?;
    let loaded = load_config(&LoadOptions {
        config_file: Some(config_file),
        overrides: vec![
            ConfigOverride::section("backup", "dry-run", true),
            ConfigOverride::section("backup-no-timestamp", "dry-run", true),
        ],
    })?;
    let engine = ArchiveEngine::from_config(&loaded.config, &HandlerRegistry::builtin())?;
    let report = engine.archive_all();

    assert_eq!(report.count(CopyOutcome::DryRun), 2);
    assert!(!destination.exists());
    Ok(())
}
