/// Expected database schema version
/// All databases must use this version for compatibility
pub const EXPECTED_DB_VERSION: &str = "1";

/// Metadata key holding the schema version
pub const VERSION_KEY: &str = "version";

/// File category written by the recorder subsystem
pub const RECORDER_CATEGORY: &str = "recorder";

/// Path suffix of recorder fragments (fMP4 media segments)
pub const FRAGMENT_EXTENSION: &str = ".m4s";

/// Extension used for the external recording filename
pub const RECORDING_EXTENSION: &str = "mp4";

/// Nested key path of the fragment play length inside file metadata
pub const DURATION_META_PATH: [&str; 2] = ["m3u8", "EXTINF"];
