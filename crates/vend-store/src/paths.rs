use std::env;
use std::path::{Path, PathBuf};

/// Default base directory for all vend storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".vend")
}

/// Database path inside `base` (or the default base directory).
pub fn db_path(base: Option<&Path>) -> PathBuf {
    base.map(Path::to_path_buf)
        .unwrap_or_else(default_base_dir)
        .join("vend.db3")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
