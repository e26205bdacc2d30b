//! Run summary renderers.

use std::io::{self, Write};

use anyhow::anyhow;
use arkive_fsops::{ArchiveReport, CopyOutcome};

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

pub(crate) fn render_report(report: &ArchiveReport, format: OutputFormat) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, report, format)
}

pub(crate) fn write_report(
    out: &mut impl Write,
    report: &ArchiveReport,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(report)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            writeln!(out, "{text}").map_err(write_failed)?;
        }
        OutputFormat::Table => write_table(out, report).map_err(write_failed)?,
    }
    Ok(())
}

fn write_table(out: &mut impl Write, report: &ArchiveReport) -> io::Result<()> {
    for record in &report.records {
        writeln!(
            out,
            "{:<16} {} -> {}",
            record.outcome.as_str(),
            record.source_path.display(),
            record.destination.display()
        )?;
    }
    for failure in &report.failures {
        writeln!(
            out,
            "{:<16} {}: {}",
            "failed",
            failure.path.display(),
            failure.message
        )?;
    }
    writeln!(
        out,
        "copied: {}, already present: {}, dry run: {}, failed: {}",
        report.count(CopyOutcome::Copied),
        report.count(CopyOutcome::AlreadyPresent),
        report.count(CopyOutcome::DryRun),
        report.failures.len()
    )
}

fn write_failed(err: io::Error) -> CliError {
    CliError::failure(anyhow!("failed to write summary: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arkive_config::ProfileKind;
    use arkive_fsops::{ArchiveRecord, FileFailure};
    use std::path::PathBuf;
    use uuid::Uuid;

    type TestResult<T> = anyhow::Result<T>;

    fn sample_report() -> ArchiveReport {
        ArchiveReport {
            run_id: Uuid::nil(),
            records: vec![ArchiveRecord {
                source: "phone".to_string(),
                source_path: PathBuf::from("/in/a.jpg"),
                extension: "jpg".to_string(),
                timestamp: None,
                profile: ProfileKind::BackupNoTimestamp,
                hash: "abcdefghijklmnop".to_string(),
                destination: PathBuf::from("/out/phone/unknown/phone-abcdefghijklmnop.jpg"),
                outcome: CopyOutcome::Copied,
            }],
            failures: vec![FileFailure {
                source: "phone".to_string(),
                path: PathBuf::from("/in/b.jpg"),
                destination: None,
                message: "fsops io failure during hash.open on '/in/b.jpg'".to_string(),
            }],
        }
    }

    fn render(format: OutputFormat) -> TestResult<String> {
        let mut buffer = Vec::new();
        write_report(&mut buffer, &sample_report(), format)
            .map_err(|err| anyhow!(err.display_message()))?;
        Ok(String::from_utf8(buffer)?)
    }

    #[test]
    fn table_lists_records_failures_and_totals() -> TestResult<()> {
        let text = render(OutputFormat::Table)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("copied "));
        assert!(lines[0].ends_with("/in/a.jpg -> /out/phone/unknown/phone-abcdefghijklmnop.jpg"));
        assert!(lines[1].starts_with("failed "));
        assert_eq!(
            lines[2],
            "copied: 1, already present: 0, dry run: 0, failed: 1"
        );
        Ok(())
    }

    #[test]
    fn json_is_machine_readable() -> TestResult<()> {
        let value: serde_json::Value = serde_json::from_str(&render(OutputFormat::Json)?)?;
        assert_eq!(value["records"][0]["outcome"], "copied");
        assert_eq!(value["failures"][0]["path"], "/in/b.jpg");
        Ok(())
    }
}
