use crate::consts::{APP_NAME, BACKEND_DIRNAME, DATA_DIR_ENV, STATE_FILENAME};
use std::path::PathBuf;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the directory for data files for the application.
///
/// `STACKUP_DATA_DIR` wins over the platform default.
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
    return PathBuf::from(dir);
  }
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
}

/// Returns the directory for data files for the application.
///
/// `STACKUP_DATA_DIR` wins over `XDG_DATA_HOME`.
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
    return PathBuf::from(dir);
  }
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Default location of the live run record.
pub fn state_path() -> PathBuf {
  data_dir().join(STATE_FILENAME)
}

/// Default root of the local provisioning backend.
pub fn backend_dir() -> PathBuf {
  data_dir().join(BACKEND_DIRNAME)
}
