//! Centralized path functions for app storage locations.

use std::path::PathBuf;

const APP_DIR: &str = "proofread";

/// App data root: `~/Library/Application Support/proofread/` (macOS) or
/// `~/.local/share/proofread/` (Linux).
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR))
}

/// File backing one key of the JSON store: `<dir>/<key>.json`.
pub fn store_file(dir: &std::path::Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}
