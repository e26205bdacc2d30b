//! Destination filename templates.
//!
//! Templates use named placeholders: `{source}`, `{hash}`, and `{timestamp}`
//! with an optional strftime spec (`{timestamp:%Y-%m}`). `{{` and `}}` are
//! literal braces. Templates are compiled once and rendered per file.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};

use crate::error::{FsOpsError, FsOpsResult};

/// Layout used for a `{timestamp}` placeholder without a format spec.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Source,
    Hash,
    Timestamp(String),
}

/// Compiled filename template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    text: String,
    segments: Vec<Segment>,
}

impl FilenameTemplate {
    /// Compile `text`.
    ///
    /// # Errors
    ///
    /// Returns `FsOpsError::InvalidTemplate` for unbalanced braces, unknown or
    /// positional placeholders, conversions, format specs on `source` or
    /// `hash`, and strftime specs chrono cannot format.
    pub fn parse(text: &str) -> FsOpsResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(FsOpsError::template(
                        text,
                        "single '}' outside a placeholder",
                        None,
                    ));
                }
                '{' => {
                    let mut field = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(FsOpsError::template(
                                    text,
                                    "nested braces are not supported",
                                    Some(field),
                                ));
                            }
                            _ => field.push(inner),
                        }
                    }
                    if !closed {
                        return Err(FsOpsError::template(
                            text,
                            "unclosed placeholder",
                            Some(field),
                        ));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_field(text, &field)?);
                }
                _ => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    /// Template source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether any placeholder needs a timestamp.
    #[must_use]
    pub fn uses_timestamp(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Timestamp(_)))
    }

    /// Render the template for one file, without extension.
    ///
    /// # Errors
    ///
    /// Returns `FsOpsError::MissingTimestamp` when the template references the
    /// timestamp and `timestamp` is `None`.
    pub fn render(
        &self,
        source: &str,
        timestamp: Option<NaiveDateTime>,
        hash: &str,
    ) -> FsOpsResult<String> {
        let mut rendered = String::with_capacity(self.text.len() + hash.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Source => rendered.push_str(source),
                Segment::Hash => rendered.push_str(hash),
                Segment::Timestamp(format) => {
                    let timestamp = timestamp.ok_or_else(|| FsOpsError::MissingTimestamp {
                        template: self.text.clone(),
                    })?;
                    write!(rendered, "{}", timestamp.format(format)).map_err(|_| {
                        FsOpsError::template(
                            &self.text,
                            "timestamp could not be formatted",
                            Some(format.clone()),
                        )
                    })?;
                }
            }
        }
        Ok(rendered)
    }
}

fn parse_field(text: &str, field: &str) -> FsOpsResult<Segment> {
    let (name, spec) = field.split_once(':').unwrap_or((field, ""));
    if name.contains('!') {
        return Err(FsOpsError::template(
            text,
            "conversions are not supported",
            Some(field.to_string()),
        ));
    }
    match name {
        "source" | "hash" if !spec.is_empty() => Err(FsOpsError::template(
            text,
            "format specs only apply to timestamp",
            Some(field.to_string()),
        )),
        "source" => Ok(Segment::Source),
        "hash" => Ok(Segment::Hash),
        "timestamp" if spec.is_empty() => {
            Ok(Segment::Timestamp(DEFAULT_TIMESTAMP_FORMAT.to_string()))
        }
        "timestamp" => {
            if !formats_naive_datetime(spec) {
                return Err(FsOpsError::template(
                    text,
                    "invalid strftime format",
                    Some(spec.to_string()),
                ));
            }
            Ok(Segment::Timestamp(spec.to_string()))
        }
        "" => Err(FsOpsError::template(
            text,
            "positional placeholders are not supported",
            None,
        )),
        _ => Err(FsOpsError::template(
            text,
            "unknown placeholder",
            Some(name.to_string()),
        )),
    }
}

/// Whether `spec` parses and renders for a timestamp without a timezone.
///
/// Offset directives such as `%z` parse but fail to render, so the format is
/// also rendered once against a fixed timestamp.
fn formats_naive_datetime(spec: &str) -> bool {
    if StrftimeItems::new(spec).any(|item| matches!(item, Item::Error)) {
        return false;
    }
    let mut sample = String::new();
    write!(sample, "{}", NaiveDateTime::default().format(spec)).is_ok()
}

/// Render `template` and append `.extension` when the extension is non-empty.
///
/// # Errors
///
/// Propagates rendering errors from [`FilenameTemplate::render`].
pub fn synthesize(
    template: &FilenameTemplate,
    source: &str,
    timestamp: Option<NaiveDateTime>,
    hash: &str,
    extension: &str,
) -> FsOpsResult<String> {
    let mut rendered = template.render(source, timestamp, hash)?;
    if !extension.is_empty() {
        rendered.push('.');
        rendered.push_str(extension);
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use chrono::NaiveDate;

    type TestResult<T> = Result<T>;

    const BACKUP: &str = "{source}/{timestamp:%Y-%m}/{source}-{timestamp:%Y%m%d_%H%M%S}-{hash}";
    const NO_TIMESTAMP: &str = "{source}/unknown/{source}-{hash}";

    fn sample_time() -> TestResult<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2016, 5, 4)
            .and_then(|date| date.and_hms_opt(3, 2, 1))
            .ok_or_else(|| anyhow!("invalid sample date"))
    }

    fn reason_of(result: FsOpsResult<FilenameTemplate>) -> Option<&'static str> {
        match result {
            Err(FsOpsError::InvalidTemplate { reason, .. }) => Some(reason),
            _ => None,
        }
    }

    #[test]
    fn default_templates_render_expected_layout() -> TestResult<()> {
        let backup = FilenameTemplate::parse(BACKUP)?;
        assert!(backup.uses_timestamp());
        assert_eq!(
            synthesize(&backup, "phone", Some(sample_time()?), "abcdefgh", "jpg")?,
            "phone/2016-05/phone-20160504_030201-abcdefgh.jpg"
        );

        let fallback = FilenameTemplate::parse(NO_TIMESTAMP)?;
        assert!(!fallback.uses_timestamp());
        assert_eq!(
            synthesize(&fallback, "phone", None, "abcdefghijklmnop", "png")?,
            "phone/unknown/phone-abcdefghijklmnop.png"
        );
        Ok(())
    }

    #[test]
    fn empty_extension_adds_no_dot() -> TestResult<()> {
        let template = FilenameTemplate::parse(NO_TIMESTAMP)?;
        assert_eq!(
            synthesize(&template, "cam", None, "hash", "")?,
            "cam/unknown/cam-hash"
        );
        Ok(())
    }

    #[test]
    fn bare_timestamp_and_escaped_braces() -> TestResult<()> {
        let template = FilenameTemplate::parse("{{{hash}}} {timestamp}")?;
        assert_eq!(
            template.render("s", Some(sample_time()?), "abc")?,
            "{abc} 2016-05-04 03:02:01"
        );
        assert_eq!(template.as_str(), "{{{hash}}} {timestamp}");
        Ok(())
    }

    #[test]
    fn rendering_timestamp_without_one_is_an_error() -> TestResult<()> {
        let template = FilenameTemplate::parse(BACKUP)?;
        assert!(matches!(
            template.render("phone", None, "abc"),
            Err(FsOpsError::MissingTimestamp { .. })
        ));
        Ok(())
    }

    #[test]
    fn malformed_templates_are_rejected() {
        let cases = [
            ("{nope}", "unknown placeholder"),
            ("{timestamp.year}", "unknown placeholder"),
            ("{}", "positional placeholders are not supported"),
            ("{source!r}", "conversions are not supported"),
            ("{hash:>8}", "format specs only apply to timestamp"),
            ("{timestamp:%Y-%}", "invalid strftime format"),
            ("{timestamp:%z}", "invalid strftime format"),
            ("{source}/{timestamp:%Y%:z}-{hash}", "invalid strftime format"),
            ("{timestamp:%Z}", "invalid strftime format"),
            ("{source", "unclosed placeholder"),
            ("a}b", "single '}' outside a placeholder"),
            ("{a{b}}", "nested braces are not supported"),
        ];
        for (text, expected) in cases {
            assert_eq!(
                reason_of(FilenameTemplate::parse(text)),
                Some(expected),
                "template {text}"
            );
        }
    }

    #[test]
    fn literal_only_template_renders_verbatim() -> TestResult<()> {
        let template = FilenameTemplate::parse("fixed/name")?;
        assert_eq!(template.render("x", None, "y")?, "fixed/name");
        Ok(())
    }
}
