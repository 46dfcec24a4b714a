//! Crate-wide constants.

/// Application name, used for data directory layout.
pub const APP_NAME: &str = "stackup";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STACKUP_DATA_DIR";

/// File name of the live run record within the data directory.
pub const STATE_FILENAME: &str = "state.json";

/// Directory name of the local backend within the data directory.
pub const BACKEND_DIRNAME: &str = "backend";

/// Current on-disk run record format.
pub const STATE_VERSION: u32 = 1;

/// Length of the truncated hex fingerprint stored per resource.
pub const FINGERPRINT_LEN: usize = 20;

/// Length of the short identifier embedded in synthesized resource handles.
pub const HANDLE_HASH_LEN: usize = 8;
