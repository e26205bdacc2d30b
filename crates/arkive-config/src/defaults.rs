//! Built-in configuration defaults.
//!
//! # Design
//! - The defaults are a TOML document so user files merge onto them table by table.
//! - Keep the default filename templates stable; archived paths depend on them.

/// Configuration file consulted when no explicit path is supplied.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/arkive.toml";

/// Document every user configuration is layered on top of.
pub const DEFAULT_DOCUMENT: &str = r#"
destination = "."
workers = 1

[sources]

[backup]
filename-format = "{source}/{timestamp:%Y-%m}/{source}-{timestamp:%Y%m%d_%H%M%S}-{hash}"
hash-algorithm = "md5"
hash-length = 8
dry-run = false

[backup-no-timestamp]
filename-format = "{source}/unknown/{source}-{hash}"
hash-algorithm = "md5"
hash-length = 16
dry-run = false

[extension-map]
jpeg = "jpg"
tiff = "tif"

[extension-handlers]
jpg = "exif"
tif = "exif"

[logging]
level = "warn"
"#;
