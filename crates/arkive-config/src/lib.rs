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

//! Layered configuration for the archiver.
//!
//! Layout: `defaults.rs` (built-in document), `loader.rs` (file discovery,
//! table merging, overrides), `validate.rs` (field parsing helpers),
//! `model.rs` (typed configuration handed to the pipeline).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::{DEFAULT_CONFIG_FILE, DEFAULT_DOCUMENT};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigOverride, LoadOptions, LoadedConfig, load_config, merge_tables};
pub use model::{
    ArkiveConfig, FormatProfile, HashAlgorithm, LogFormatSetting, LoggingSettings, ProfileKind,
};
