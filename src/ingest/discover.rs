// Scope and file discovery for a takeout

use std::cell::OnceCell;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use regex::Regex;
use walkdir::WalkDir;

use crate::constants::{SCOPE_FOLDER_PATTERN, SIDECAR_EXTENSION};
use crate::error::{ArchiveError, Result};

/// One `Photos from YYYY` folder, processed as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub name: String,
    pub year: String,
    pub path: PathBuf,
}

/// A photo or video discovered in a scope.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Name as stored on disk; the archive copy keeps it byte for byte
    pub name: OsString,
    /// Lossy UTF-8 form of `name`, for matching and messages
    pub file_name: String,
    /// Lowercased extension without the dot
    pub extension: Option<String>,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl MediaFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .ok_or_else(|| ArchiveError::InvalidPath(format!("No filename: {}", path.display())))?
            .to_os_string();
        let meta = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file_name: name.to_string_lossy().to_string(),
            name,
            extension: lowercase_extension(path),
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// A JSON sidecar discovered in a scope.
#[derive(Debug)]
pub struct SidecarCandidate {
    pub path: PathBuf,
    pub file_name: String,
    lower_name: String,
    title: OnceCell<Option<String>>,
}

impl SidecarCandidate {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file_name = file_name_of(&path)?;
        Ok(Self {
            lower_name: file_name.to_lowercase(),
            file_name,
            path,
            title: OnceCell::new(),
        })
    }

    pub fn lower_name(&self) -> &str {
        &self.lower_name
    }

    /// The sidecar's `title` field, read from disk on first use.
    pub fn title(&self) -> Option<&str> {
        self.title
            .get_or_init(|| crate::metadata::read_title(&self.path))
            .as_deref()
    }

    /// True once the body has been read for a title lookup.
    #[cfg(test)]
    pub(crate) fn body_inspected(&self) -> bool {
        self.title.get().is_some()
    }
}

/// All sidecars of one scope, sorted by path.
#[derive(Debug, Default)]
pub struct SidecarIndex {
    candidates: Vec<SidecarCandidate>,
}

impl SidecarIndex {
    pub fn new(mut paths: Vec<PathBuf>) -> Result<Self> {
        paths.sort();
        paths.dedup();
        let candidates = paths
            .into_iter()
            .map(SidecarCandidate::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { candidates })
    }

    pub fn candidates(&self) -> &[SidecarCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Media files and sidecars of one scope.
#[derive(Debug, Default)]
pub struct ScopeListing {
    pub media: Vec<MediaFile>,
    pub sidecars: SidecarIndex,
}

/// Find `Photos from YYYY` folders directly under the takeout root, sorted by name.
pub fn discover_scopes(input_root: &Path) -> Result<Vec<Scope>> {
    let pattern = Regex::new(SCOPE_FOLDER_PATTERN)
        .map_err(|e| ArchiveError::Other(format!("Bad scope pattern: {}", e)))?;

    let mut scopes = Vec::new();
    for entry in fs::read_dir(input_root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(caps) = pattern.captures(&name) {
            scopes.push(Scope {
                year: caps[1].to_string(),
                name,
                path,
            });
        }
    }

    scopes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scopes)
}

/// Walk a scope recursively and split it into media files and sidecars.
/// Both lists are sorted by path.
pub fn scan_scope(scope_path: &Path) -> Result<ScopeListing> {
    if !scope_path.is_dir() {
        return Err(ArchiveError::InvalidPath(format!(
            "Scope is not a directory: {}",
            scope_path.display()
        )));
    }

    let mut media = Vec::new();
    let mut sidecar_paths = Vec::new();

    for entry in WalkDir::new(scope_path).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", scope_path.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        if is_sidecar_file(path) {
            sidecar_paths.push(path.to_path_buf());
        } else {
            match MediaFile::from_path(path) {
                Ok(m) => media.push(m),
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }

    media.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ScopeListing {
        media,
        sidecars: SidecarIndex::new(sidecar_paths)?,
    })
}

/// Every non-sidecar file is treated as media.
pub fn is_sidecar_file(path: &Path) -> bool {
    lowercase_extension(path).as_deref() == Some(SIDECAR_EXTENSION)
}

pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ArchiveError::InvalidPath(format!("No filename: {}", path.display())))
}
