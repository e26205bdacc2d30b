#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Archiving pipeline: hash, timestamp, name, and copy files into a
//! deterministic destination tree.
//!
//! Layout: `encode.rs` and `hasher.rs` (content hashes), `timestamp.rs`
//! (embedded timestamp capabilities), `template.rs` (destination names),
//! `plan.rs` (compiled configuration), `engine.rs` (discovery and copying),
//! `report.rs` (run results).

pub mod encode;
pub mod engine;
pub mod error;
#[doc(hidden)]
pub mod fixtures;
pub mod hasher;
pub mod plan;
pub mod report;
pub mod template;
pub mod timestamp;

pub use encode::{BITS_PER_CHAR, bytes_for_length, encode_hash};
pub use engine::{ArchiveEngine, SourceFile, copy_if_absent, list_regular_files};
pub use error::{FsOpsError, FsOpsResult};
pub use hasher::{DigestKind, HASH_BUFFER_SIZE, hash_file, hash_path, hash_reader};
pub use plan::{ArchivePlan, CompiledProfile};
pub use report::{ArchiveRecord, ArchiveReport, CopyOutcome, FileFailure};
pub use template::{DEFAULT_TIMESTAMP_FORMAT, FilenameTemplate, synthesize};
pub use timestamp::{
    EXIF_DATETIME_FORMAT, EXIF_HANDLER, ExifExtractor, HandlerRegistry, TimestampExtractor,
    TimestampResolver, parse_exif_datetime,
};
