// External tool resolver for exiftool
//
// Resolution order:
// 1) Environment variable override (TAKEOUT_EXIFTOOL_PATH)
// 2) Binary next to the executable (or in its bin/ subdirectory)
// 3) PATH lookup

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ArchiveError, Result};

pub const EXIFTOOL_ENV_KEY: &str = "TAKEOUT_EXIFTOOL_PATH";

/// Get the directory containing the current executable
fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
}

fn platform_filename(default_name: &str) -> String {
    let mut filename = default_name.to_string();
    if cfg!(windows) && !filename.to_lowercase().ends_with(".exe") {
        filename.push_str(".exe");
    }
    filename
}

/// Search each PATH entry for the named binary.
fn search_path(filename: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}

/// Resolve a tool path. Returns None when nothing on disk matches.
fn resolve_tool(env_key: &str, default_name: &str) -> Option<PathBuf> {
    if let Ok(v) = env::var(env_key) {
        let p = PathBuf::from(&v);
        if p.exists() {
            return Some(p);
        }
        log::warn!("{} points to missing file {}, ignoring", env_key, v);
    }

    let filename = platform_filename(default_name);

    if let Some(dir) = exe_dir() {
        let candidate = dir.join(&filename);
        if candidate.exists() {
            return Some(candidate);
        }

        let bin_candidate = dir.join("bin").join(&filename);
        if bin_candidate.exists() {
            return Some(bin_candidate);
        }
    }

    search_path(&filename)
}

/// Locate exiftool, failing with ToolUnavailable if it cannot be found or run.
pub fn locate_exiftool() -> Result<PathBuf> {
    let path = resolve_tool(EXIFTOOL_ENV_KEY, "exiftool").ok_or_else(|| {
        ArchiveError::ToolUnavailable(format!(
            "exiftool not found in PATH (set {} to override)",
            EXIFTOOL_ENV_KEY
        ))
    })?;

    if !probe(&path) {
        return Err(ArchiveError::ToolUnavailable(format!(
            "{} did not respond to -ver",
            path.display()
        )));
    }

    Ok(path)
}

/// Check that the binary at `path` runs and reports a version.
pub fn probe(path: &Path) -> bool {
    Command::new(path)
        .arg("-ver")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
