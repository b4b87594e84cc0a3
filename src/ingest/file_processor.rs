// Single-file processing: copy, classify, embed

use std::fs;
use std::path::Path;

use crate::config::ArchiveConfig;
use crate::constants::WRITABLE_EXTENSIONS;
use crate::error::{ArchiveError, Result};
use crate::metadata::exiftool::{EmbedFields, MetadataWriter};
use crate::metadata::MetadataRecord;
use super::copy::{copy_with_verify, set_mtime};
use super::discover::MediaFile;
use super::placement::{archive_location, exif_date_string};
use super::Outcome;

/// True if the writer can embed metadata into this format.
pub fn is_embeddable(media: &MediaFile) -> bool {
    media
        .extension
        .as_deref()
        .map(|ext| WRITABLE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Archive one resolved media file.
///
/// The source is copied unchanged to its month folder, then embeddable
/// formats go through the writer. A writer failure degrades to a
/// timestamp-only update. When an error is returned the archive holds no
/// copy of the file.
pub fn process_single_file(
    media: &MediaFile,
    record: &MetadataRecord,
    config: &ArchiveConfig,
    writer: &dyn MetadataWriter,
) -> Result<Outcome> {
    let missing = || ArchiveError::MissingTimestamp(media.path.display().to_string());
    let timestamp = record.timestamp.ok_or_else(missing)?;
    let dest = archive_location(&config.output_root, &media.name, timestamp, &config.time_zone)
        .ok_or_else(missing)?;
    let date_time = exif_date_string(timestamp, &config.time_zone).ok_or_else(missing)?;

    copy_with_verify(&media.path, &dest)?;
    log::debug!("Copied {} -> {}", media.path.display(), dest.display());

    if !is_embeddable(media) {
        discard_on_error(&dest, set_mtime(&dest, timestamp))?;
        log::info!("Copied only (format not writable): {}", dest.display());
        return Ok(Outcome::CopiedOnly { embed_error: None });
    }

    let fields = EmbedFields::from_record(record, date_time);
    match writer.embed(&fields, &dest) {
        Ok(()) => {
            discard_on_error(&dest, set_mtime(&dest, timestamp))?;
            log::info!("Metadata embedded: {}", dest.display());
            Ok(Outcome::MetadataEmbedded)
        }
        Err(e) => {
            log::error!("Embedding failed for {}: {}", dest.display(), e);
            discard_on_error(&dest, set_mtime(&dest, timestamp))?;
            Ok(Outcome::CopiedOnly {
                embed_error: Some(e.to_string()),
            })
        }
    }
}

/// Remove the archive copy when a step after the copy failed.
fn discard_on_error<T>(dest: &Path, step: Result<T>) -> Result<T> {
    if let Err(ref e) = step {
        log::warn!("Removing {} after failed update: {}", dest.display(), e);
        if let Err(rm) = fs::remove_file(dest) {
            log::error!("Failed to remove {}: {}", dest.display(), rm);
        }
    }
    step
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn media_with_ext(ext: Option<&str>) -> MediaFile {
        MediaFile {
            path: PathBuf::from("/scope/x"),
            name: "x".into(),
            file_name: "x".to_string(),
            extension: ext.map(String::from),
            size: 0,
            modified: None,
        }
    }

    #[test]
    fn test_is_embeddable() {
        assert!(is_embeddable(&media_with_ext(Some("jpg"))));
        assert!(is_embeddable(&media_with_ext(Some("heic"))));
        assert!(is_embeddable(&media_with_ext(Some("mp4"))));
        assert!(!is_embeddable(&media_with_ext(Some("avi"))));
        assert!(!is_embeddable(&media_with_ext(Some("mkv"))));
        assert!(!is_embeddable(&media_with_ext(None)));
    }

    #[test]
    fn test_failed_update_removes_copy() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("IMG_0001.jpg");
        fs::write(&dest, b"copied").unwrap();

        let failed: Result<()> = Err(ArchiveError::Other("mtime refused".to_string()));
        let err = discard_on_error(&dest, failed).unwrap_err();
        assert!(err.to_string().contains("mtime refused"));
        assert!(!dest.exists());

        fs::write(&dest, b"copied").unwrap();
        discard_on_error(&dest, Ok(())).unwrap();
        assert!(dest.exists());
    }
}
