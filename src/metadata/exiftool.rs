// ExifTool wrapper for embedding sidecar metadata into archived media

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use serde::Serialize;

use super::{GeoPoint, MetadataRecord};
use crate::constants::PEOPLE_SEPARATOR;
use crate::error::{ArchiveError, Result};

/// Values written into one media file. All date tags share `date_time`
/// (local wall clock, `YYYY:MM:DD HH:MM:SS`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFields {
    pub date_time: String,
    pub gps: Option<GeoPoint>,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

impl EmbedFields {
    pub fn from_record(record: &MetadataRecord, date_time: impl Into<String>) -> Self {
        let keywords = if record.people.is_empty() {
            None
        } else {
            Some(record.people.join(PEOPLE_SEPARATOR))
        };

        Self {
            date_time: date_time.into(),
            gps: record.geo,
            keywords,
            description: record.description.clone(),
        }
    }
}

/// Something that can rewrite a media file's embedded metadata in place.
pub trait MetadataWriter {
    /// Returns `ArchiveError::EmbedFailure` when the file could not be updated.
    fn embed(&self, fields: &EmbedFields, target: &Path) -> Result<()>;
}

/// Runs the exiftool binary once per file.
#[derive(Debug, Clone)]
pub struct ExifToolWriter {
    path: PathBuf,
}

impl ExifToolWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve exiftool on this machine. Fails with ToolUnavailable.
    pub fn locate() -> Result<Self> {
        let path = crate::tools::locate_exiftool()?;
        log::info!("Using exiftool at {}", path.display());
        Ok(Self::new(path))
    }
}

impl MetadataWriter for ExifToolWriter {
    fn embed(&self, fields: &EmbedFields, target: &Path) -> Result<()> {
        let output = Command::new(&self.path)
            .args(build_args(fields, target))
            .output()
            .map_err(|e| ArchiveError::EmbedFailure(format!("Failed to run exiftool: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if stderr.is_empty() {
            format!("exit code {}, no error output", output.status.code().unwrap_or(-1))
        } else {
            stderr
        };
        Err(ArchiveError::EmbedFailure(detail))
    }
}

/// Build the exiftool argument list for one file.
pub fn build_args(fields: &EmbedFields, target: &Path) -> Vec<OsString> {
    let mut args: Vec<String> = vec![
        "-overwrite_original".to_string(),
        "-q".to_string(),
        "-m".to_string(),
    ];

    for tag in ["DateTimeOriginal", "CreateDate", "ModifyDate", "FileModifyDate", "FileCreateDate"] {
        args.push(format!("-{}={}", tag, fields.date_time));
    }

    if let Some(gps) = fields.gps {
        // EXIF stores unsigned rationals; the hemisphere lives in the Ref tags
        args.push(format!("-GPSLatitude={}", gps.latitude.abs()));
        args.push(format!("-GPSLatitudeRef={}", if gps.latitude < 0.0 { "S" } else { "N" }));
        args.push(format!("-GPSLongitude={}", gps.longitude.abs()));
        args.push(format!("-GPSLongitudeRef={}", if gps.longitude < 0.0 { "W" } else { "E" }));
        if let Some(alt) = gps.altitude {
            args.push(format!("-GPSAltitude={}", alt.abs()));
            args.push(format!(
                "-GPSAltitudeRef={}",
                if alt < 0.0 { "Below Sea Level" } else { "Above Sea Level" }
            ));
        }
    }

    if let Some(ref names) = fields.keywords {
        args.push(format!("-Keywords={}", names));
        args.push(format!("-Subject={}", names));
    }

    if let Some(ref desc) = fields.description {
        args.push(format!("-ImageDescription={}", desc));
    }

    let mut os_args: Vec<OsString> = args.into_iter().map(OsString::from).collect();
    os_args.push(target.as_os_str().to_os_string());
    os_args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    #[test]
    fn test_date_only_args() {
        let fields = EmbedFields::from_record(&MetadataRecord::default(), "2020:12:31 16:00:00");
        let args = arg_strings(&build_args(&fields, Path::new("/out/IMG.jpg")));

        assert_eq!(&args[..3], ["-overwrite_original", "-q", "-m"]);
        assert!(args.contains(&"-DateTimeOriginal=2020:12:31 16:00:00".to_string()));
        assert!(args.contains(&"-FileCreateDate=2020:12:31 16:00:00".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("-GPS")));
        assert!(!args.iter().any(|a| a.starts_with("-Keywords")));
        assert_eq!(args.last().unwrap(), "/out/IMG.jpg");
    }

    #[test]
    fn test_full_record_args() {
        let record = MetadataRecord {
            timestamp: Some(1609459200),
            geo: Some(GeoPoint { latitude: -33.5, longitude: 151.25, altitude: Some(-4.0) }),
            people: vec!["Alice".to_string(), "Bob".to_string()],
            description: Some("Beach day".to_string()),
            title: None,
            url: None,
        };
        let fields = EmbedFields::from_record(&record, "2020:12:31 16:00:00");
        let args = arg_strings(&build_args(&fields, Path::new("x.jpg")));

        assert!(args.contains(&"-GPSLatitude=33.5".to_string()));
        assert!(args.contains(&"-GPSLatitudeRef=S".to_string()));
        assert!(args.contains(&"-GPSLongitude=151.25".to_string()));
        assert!(args.contains(&"-GPSLongitudeRef=E".to_string()));
        assert!(args.contains(&"-GPSAltitude=4".to_string()));
        assert!(args.contains(&"-GPSAltitudeRef=Below Sea Level".to_string()));
        assert!(args.contains(&"-Keywords=Alice; Bob".to_string()));
        assert!(args.contains(&"-Subject=Alice; Bob".to_string()));
        assert!(args.contains(&"-ImageDescription=Beach day".to_string()));
    }

    #[test]
    fn test_missing_binary_is_embed_failure() {
        let writer = ExifToolWriter::new("/definitely/not/exiftool");
        let fields = EmbedFields::from_record(&MetadataRecord::default(), "2020:01:01 00:00:00");
        let err = writer.embed(&fields, Path::new("x.jpg")).unwrap_err();
        assert!(matches!(err, ArchiveError::EmbedFailure(_)));
    }
}
