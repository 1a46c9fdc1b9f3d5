// src/constants.rs

/// The name of the directory holding hydrolib's user configuration (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "hydrolib";

/// The name of the optional user settings file (inside the config directory).
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// Number of bytes of the blake3 digest kept in a checksum (16 bytes = 32 hex characters).
pub const HASH_TRUNCATE_LENGTH: usize = 16;

/// Default stem used when a file model has no schema-specific name.
pub const DEFAULT_FILENAME: &str = "unknown";

/// Default comment delimiter of the INI-like formats.
pub const DEFAULT_COMMENT_DELIMITER: char = '#';

/// Default list delimiter for vector-valued keys.
pub const DEFAULT_LIST_DELIMITER: &str = " ";

pub const DEFAULT_SECTION_INDENT: usize = 0;
pub const DEFAULT_PROPERTY_INDENT: usize = 4;
pub const DEFAULT_DATABLOCK_INDENT: usize = 8;
pub const DEFAULT_DATABLOCK_SPACING: usize = 2;
