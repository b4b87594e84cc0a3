// Archive integrity checks used by the audit

use std::fs;
use std::path::{Path, PathBuf};
use chrono_tz::Tz;
use serde::Serialize;

use crate::constants::{SIDECAR_EXTENSION, SIZE_GROWTH_TOLERANCE, SIZE_SHRINK_TOLERANCE};
use crate::error::Result;
use super::copy::mtime_seconds;
use super::discover::lowercase_extension;
use super::placement::in_partition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeCheck {
    pub ok: bool,
    pub delta: i64,
    pub reason: String,
}

/// The archived copy may shrink by up to 32 bytes and grow by up to 10 KiB.
pub fn check_size_band(input_size: u64, output_size: u64) -> SizeCheck {
    let delta = output_size as i64 - input_size as i64;
    let (ok, reason) = if delta < -SIZE_SHRINK_TOLERANCE {
        (
            false,
            format!(
                "Output smaller than input by more than {} bytes ({} -> {}, {} bytes)",
                SIZE_SHRINK_TOLERANCE, input_size, output_size, delta
            ),
        )
    } else if delta > SIZE_GROWTH_TOLERANCE {
        (
            false,
            format!(
                "Output too much larger than input ({} -> {}, +{} bytes)",
                input_size, output_size, delta
            ),
        )
    } else {
        (
            true,
            format!(
                "Size acceptable ({} -> {}, {}{} bytes)",
                input_size,
                output_size,
                if delta >= 0 { "+" } else { "" },
                delta
            ),
        )
    };
    SizeCheck { ok, delta, reason }
}

/// Files under `<archive>/<year>/<MM>/` whose mtime, read in `tz`, is not in
/// that year and month. Sidecars and non-month folders are ignored.
pub fn find_invalid_dates(output_root: &Path, year: &str, tz: &Tz) -> Result<Vec<PathBuf>> {
    let year_dir = output_root.join(year);
    let mut invalid = Vec::new();
    let expected_year: i32 = match year.parse() {
        Ok(y) => y,
        Err(_) => return Ok(invalid),
    };
    if !year_dir.is_dir() {
        return Ok(invalid);
    }

    let mut months: Vec<_> = fs::read_dir(&year_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    months.sort();

    for month_dir in months {
        let name = month_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let expected_month: u32 = match parse_month_folder(&name) {
            Some(m) => m,
            None => continue,
        };

        let mut files: Vec<_> = fs::read_dir(&month_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| lowercase_extension(p).as_deref() != Some(SIDECAR_EXTENSION))
            .collect();
        files.sort();

        for file in files {
            match mtime_seconds(&file) {
                Ok(ts) if in_partition(ts, tz, expected_year, expected_month) => {}
                Ok(_) => invalid.push(file),
                Err(e) => log::warn!("Could not read mtime of {}: {}", file.display(), e),
            }
        }
    }

    Ok(invalid)
}

fn parse_month_folder(name: &str) -> Option<u32> {
    if name.len() != 2 || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok().filter(|m| (1..=12).contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::copy::set_mtime;
    use chrono_tz::America::Los_Angeles;

    #[test]
    fn test_size_band_edges() {
        assert!(check_size_band(1000, 1000).ok);
        assert!(check_size_band(1000, 968).ok);
        assert!(!check_size_band(1000, 967).ok);
        assert!(check_size_band(1000, 11240).ok);
        assert!(!check_size_band(1000, 11241).ok);
        assert_eq!(check_size_band(10, 0).delta, -10);
        assert!(check_size_band(10, 0).ok);
    }

    #[test]
    fn test_size_band_reasons() {
        assert!(check_size_band(1000, 900).reason.starts_with("Output smaller"));
        assert!(check_size_band(0, 20_000).reason.starts_with("Output too much larger"));
        assert!(check_size_band(100, 150).reason.contains("+50 bytes"));
    }

    #[test]
    fn test_parse_month_folder() {
        assert_eq!(parse_month_folder("01"), Some(1));
        assert_eq!(parse_month_folder("12"), Some(12));
        assert_eq!(parse_month_folder("13"), None);
        assert_eq!(parse_month_folder("1"), None);
        assert_eq!(parse_month_folder("ab"), None);
    }

    #[test]
    fn test_find_invalid_dates() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dec = tmp.path().join("2020").join("12");
        fs::create_dir_all(&dec).unwrap();

        let good = dec.join("good.jpg");
        let bad = dec.join("bad.jpg");
        let sidecar = dec.join("stray.json");
        for f in [&good, &bad, &sidecar] {
            fs::write(f, b"x").unwrap();
        }
        // 2020-12-31 16:00 local
        set_mtime(&good, 1609459200).unwrap();
        // 2021-06-15 local
        set_mtime(&bad, 1623758400).unwrap();
        set_mtime(&sidecar, 1623758400).unwrap();

        let invalid = find_invalid_dates(tmp.path(), "2020", &Los_Angeles).unwrap();
        assert_eq!(invalid, vec![bad]);

        assert!(find_invalid_dates(tmp.path(), "1999", &Los_Angeles).unwrap().is_empty());
    }
}
