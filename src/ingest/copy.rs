// File copy operations for archiving

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::constants::{HASH_CHUNK_SIZE, TEMP_FILE_PREFIX};
use crate::error::{ArchiveError, Result};
use crate::hash::{format_hash, verify_hash};

/// Copy `source` to `dest` byte for byte, replacing any existing file.
///
/// Bytes are streamed into a temp file beside `dest` while being hashed, then
/// read back and re-hashed. Only a verified copy is renamed into place, so a
/// failed copy never leaves a partial archive entry. Returns the content hash.
pub fn copy_with_verify(source: &Path, dest: &Path) -> Result<String> {
    let parent = dest
        .parent()
        .ok_or_else(|| ArchiveError::InvalidPath(format!("No parent: {}", dest.display())))?;
    fs::create_dir_all(parent)?;

    let temp = temp_path_for(dest)?;
    let result = stream_and_verify(source, &temp);

    match result {
        Ok(hash) => {
            if let Err(e) = fs::rename(&temp, dest) {
                let _ = fs::remove_file(&temp);
                return Err(ArchiveError::Copy(format!(
                    "Failed to move copy into place at {}: {}",
                    dest.display(),
                    e
                )));
            }
            Ok(hash)
        }
        Err(e) => {
            let _ = fs::remove_file(&temp);
            Err(e)
        }
    }
}

fn stream_and_verify(source: &Path, temp: &Path) -> Result<String> {
    let mut reader = File::open(source)
        .map_err(|e| ArchiveError::Copy(format!("Failed to open {}: {}", source.display(), e)))?;
    let mut writer = File::create(temp)
        .map_err(|e| ArchiveError::Copy(format!("Failed to create {}: {}", temp.display(), e)))?;

    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        writer.write_all(&buffer[..n])?;
    }
    writer.sync_all()?;
    drop(writer);

    let written = format_hash(&hasher.finalize());
    if !verify_hash(temp, &written)? {
        return Err(ArchiveError::Copy(format!(
            "Verification failed for {}: read-back hash differs from {}",
            source.display(),
            written
        )));
    }

    Ok(written)
}

fn temp_path_for(dest: &Path) -> Result<PathBuf> {
    let name = dest
        .file_name()
        .ok_or_else(|| ArchiveError::InvalidPath(format!("No filename: {}", dest.display())))?;
    let mut temp_name = std::ffi::OsString::from(TEMP_FILE_PREFIX);
    temp_name.push(name);
    Ok(dest.with_file_name(temp_name))
}

/// Set a file's modification time to the given epoch seconds.
pub fn set_mtime(path: &Path, timestamp: i64) -> Result<()> {
    filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(timestamp, 0))?;
    Ok(())
}

/// Modification time of a file as epoch seconds.
pub fn mtime_seconds(path: &Path) -> Result<i64> {
    let meta = fs::metadata(path)?;
    Ok(filetime::FileTime::from_last_modification_time(&meta).unix_seconds())
}
