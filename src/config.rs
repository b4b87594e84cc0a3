// Run configuration for processing and auditing a takeout

use std::path::{Path, PathBuf};
use chrono_tz::Tz;

use crate::constants::{DEFAULT_TIME_ZONE, PROCESSED_FOLDER};
use crate::error::{ArchiveError, Result};

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Takeout root containing the `Photos from YYYY` scopes
    pub input_root: PathBuf,
    /// Archive root receiving `YYYY/MM/<file>`
    pub output_root: PathBuf,
    /// Where skip-lists, summaries and audit results are written
    pub report_dir: PathBuf,
    pub time_zone: Tz,
    /// Folder holding skip-lists from an earlier run; restricts processing to them
    pub retry_dir: Option<PathBuf>,
}

impl ArchiveConfig {
    pub fn new(input_root: impl Into<PathBuf>) -> Self {
        let input_root = input_root.into();
        Self {
            output_root: input_root.join(PROCESSED_FOLDER),
            report_dir: input_root.clone(),
            input_root,
            time_zone: chrono_tz::America::Los_Angeles,
            retry_dir: None,
        }
    }

    pub fn with_output_root(mut self, output_root: Option<PathBuf>) -> Self {
        if let Some(out) = output_root {
            self.output_root = out;
        }
        self
    }

    pub fn with_report_dir(mut self, report_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = report_dir {
            self.report_dir = dir;
        }
        self
    }

    pub fn with_time_zone(mut self, name: &str) -> Result<Self> {
        self.time_zone = parse_time_zone(name)?;
        Ok(self)
    }

    pub fn with_retry_dir(mut self, retry_dir: Option<PathBuf>) -> Self {
        self.retry_dir = retry_dir;
        self
    }

    /// Check the configuration against the filesystem before any scope is touched.
    pub fn validate(&self) -> Result<()> {
        if !self.input_root.is_dir() {
            return Err(ArchiveError::Config(format!(
                "Input path is not a directory: {}",
                self.input_root.display()
            )));
        }

        if let Some(ref retry) = self.retry_dir {
            if !retry.is_dir() {
                return Err(ArchiveError::Config(format!(
                    "Retry folder is not a directory: {}",
                    retry.display()
                )));
            }
            // The run rewrites the lists it would be reading
            if same_path(retry, &self.report_dir) {
                return Err(ArchiveError::Config(
                    "Retry folder and report folder cannot be the same".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Parse an IANA zone name such as `America/Los_Angeles`.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| ArchiveError::TimeZone(format!("{}: {}", name, e)))
}

pub fn default_time_zone_name() -> &'static str {
    DEFAULT_TIME_ZONE
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ArchiveConfig::new("/takeout");
        assert_eq!(config.output_root, PathBuf::from("/takeout/processed"));
        assert_eq!(config.report_dir, PathBuf::from("/takeout"));
        assert_eq!(config.time_zone.name(), default_time_zone_name());
        assert!(config.retry_dir.is_none());
    }

    #[test]
    fn test_time_zone_override() {
        let config = ArchiveConfig::new("/takeout").with_time_zone("Europe/Berlin").unwrap();
        assert_eq!(config.time_zone, chrono_tz::Europe::Berlin);

        let err = ArchiveConfig::new("/takeout").with_time_zone("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, ArchiveError::TimeZone(_)));
    }

    #[test]
    fn test_validate_rejects_retry_equal_to_report_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = ArchiveConfig::new(tmp.path()).with_retry_dir(Some(tmp.path().to_path_buf()));
        assert!(matches!(config.validate(), Err(ArchiveError::Config(_))));

        let retry = tmp.path().join("retry");
        std::fs::create_dir_all(&retry).unwrap();
        let config = ArchiveConfig::new(tmp.path()).with_retry_dir(Some(retry));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_input() {
        let config = ArchiveConfig::new("/definitely/not/a/takeout");
        assert!(config.validate().is_err());
    }
}
