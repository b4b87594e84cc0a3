// Archive placement: capture instant -> archive_root/YYYY/MM/<file>

use std::path::{Path, PathBuf};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;

use crate::constants::EXIF_DATE_FORMAT;

/// Convert epoch seconds to the configured zone. None for out-of-range values.
pub fn local_time(timestamp: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|utc| utc.with_timezone(tz))
}

/// Destination for a media file. Year and month come from the local instant.
pub fn archive_location(
    output_root: &Path,
    file_name: impl AsRef<Path>,
    timestamp: i64,
    tz: &Tz,
) -> Option<PathBuf> {
    let local = local_time(timestamp, tz)?;
    Some(
        output_root
            .join(format!("{:04}", local.year()))
            .join(format!("{:02}", local.month()))
            .join(file_name),
    )
}

/// Local wall clock in EXIF form, `YYYY:MM:DD HH:MM:SS`.
pub fn exif_date_string(timestamp: i64, tz: &Tz) -> Option<String> {
    local_time(timestamp, tz).map(|t| t.format(EXIF_DATE_FORMAT).to_string())
}

/// True if the instant falls inside the given year/month in `tz`.
pub fn in_partition(timestamp: i64, tz: &Tz, year: i32, month: u32) -> bool {
    local_time(timestamp, tz)
        .map(|t| t.year() == year && t.month() == month)
        .unwrap_or(false)
}
