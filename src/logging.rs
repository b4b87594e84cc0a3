// Logger setup: every record goes to stderr and, optionally, to a run log file

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::constants::{FILE_STAMP_FORMAT, LOG_TIME_FORMAT};
use crate::error::{ArchiveError, Result};

/// `YYYY-MM-DD HH:MM:SS LEVEL | message`, local wall clock.
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        write!(
            writer,
            "{} {} | ",
            chrono::Local::now().format(LOG_TIME_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Default log file path: `<dir>/takeout_<command>_<stamp>.log`.
pub fn default_log_path(dir: &Path, command: &str) -> PathBuf {
    let stamp = chrono::Local::now().format(FILE_STAMP_FORMAT);
    dir.join(format!("takeout_{}_{}.log", command, stamp))
}

/// Appending, never-rotating writer for one log file.
fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| ArchiveError::InvalidPath(format!("No log file name: {}", path.display())))?;
    fs::create_dir_all(dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .map_err(|e| ArchiveError::Other(format!("Failed to open log file {}: {}", path.display(), e)))
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
///
/// `log` records from the library are bridged in. Keep the returned guard
/// alive until exit so buffered file lines are flushed.
pub fn init_logging(log_file: Option<&Path>, verbose: bool) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .event_format(LineFormat);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(LineFormat),
        )
        .with(file_layer)
        .with(filter)
        .try_init()
        .map_err(|e| ArchiveError::Other(format!("Logger already initialised: {}", e)))?;

    if let Some(path) = log_file {
        log::info!("Logging to {}", path.display());
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_path_shape() {
        let path = default_log_path(Path::new("/takeout"), "process");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("takeout_process_"));
        assert!(name.ends_with(".log"));
        assert_eq!(path.parent().unwrap(), Path::new("/takeout"));
    }

    #[test]
    fn test_file_lines_use_run_format() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("run.log");
        let appender = file_appender(&path).unwrap();

        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .event_format(LineFormat),
        );
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("hello log");
            tracing::warn!("second line");
        });

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" INFO | hello log"));
        assert!(lines[1].ends_with(" WARN | second line"));
        // "YYYY-MM-DD HH:MM:SS" prefix
        assert_eq!(lines[0].as_bytes()[4], b'-');
        assert_eq!(lines[0].as_bytes()[13], b':');
    }
}
