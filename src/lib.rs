// Takeout Archive - Library Entry Point
//
// Files a Google Photos takeout into an `YYYY/MM` archive, embedding the
// metadata from each media file's JSON sidecar, and audits the result.

pub mod constants;
pub mod error;
pub mod tools;
pub mod config;
pub mod logging;
pub mod hash;
pub mod metadata;
pub mod ingest;

pub use config::ArchiveConfig;
pub use error::{ArchiveError, Result};
pub use ingest::{run_archive, run_audit, AuditReport, Outcome, RunStats};
pub use metadata::exiftool::{ExifToolWriter, MetadataWriter};
