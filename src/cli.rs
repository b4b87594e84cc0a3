// Takeout Archive CLI binary

use std::path::{Path, PathBuf};
use clap::{Args, Parser, Subcommand};
use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;

use takeout_archive::config::{default_time_zone_name, ArchiveConfig};
use takeout_archive::ingest::{audit, report};
use takeout_archive::logging::{default_log_path, init_logging};
use takeout_archive::{run_archive, run_audit, ExifToolWriter};

#[derive(Parser)]
#[command(name = "takeout")]
#[command(about = "Archive a Google Photos takeout into YYYY/MM folders with embedded metadata", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy every media file into the archive and embed its sidecar metadata
    Process {
        #[command(flatten)]
        common: CommonArgs,
        /// Folder holding YYYY_skipped_files.txt lists; only those files are retried
        #[arg(long, value_name = "DIR")]
        retry_skipped: Option<PathBuf>,
    },

    /// Check an existing archive against the takeout
    Audit {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Takeout root containing the "Photos from YYYY" folders
    input: PathBuf,
    /// Archive root (defaults to <INPUT>/processed)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// IANA time zone used for folder placement and EXIF dates
    #[arg(long, default_value = default_time_zone_name())]
    time_zone: String,
    /// Where lists and summaries are written (defaults to <INPUT>)
    #[arg(long)]
    report_dir: Option<PathBuf>,
    /// Log file path (defaults to a timestamped file in the report dir)
    #[arg(long, conflicts_with = "no_log_file")]
    log_file: Option<PathBuf>,
    /// Only log to stderr
    #[arg(long)]
    no_log_file: bool,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process { common, retry_skipped } => cmd_process(common, retry_skipped),
        Commands::Audit { common } => cmd_audit(common),
    }
}

fn build_config(common: &CommonArgs, retry: Option<PathBuf>) -> Result<ArchiveConfig> {
    let input = common.input.canonicalize()
        .map_err(|_| anyhow::anyhow!("Input path does not exist: {}", common.input.display()))?;

    let config = ArchiveConfig::new(input)
        .with_output_root(common.output.clone())
        .with_report_dir(common.report_dir.clone())
        .with_retry_dir(retry)
        .with_time_zone(&common.time_zone)?;
    config.validate()?;
    Ok(config)
}

fn start_logging(common: &CommonArgs, report_dir: &Path, command: &str) -> Result<Option<WorkerGuard>> {
    let log_file = if common.no_log_file {
        None
    } else {
        Some(common.log_file.clone().unwrap_or_else(|| default_log_path(report_dir, command)))
    };
    Ok(init_logging(log_file.as_deref(), common.verbose)?)
}

fn cmd_process(common: CommonArgs, retry_skipped: Option<PathBuf>) -> Result<()> {
    let config = build_config(&common, retry_skipped)?;
    let _log_guard = start_logging(&common, &config.report_dir, "process")?;

    // Fatal before any scope is touched
    let writer = ExifToolWriter::locate()?;

    let run = run_archive(&config, &writer)?;

    println!();
    println!("{}", report::format_run_summary(&run));
    println!("Archive: {}", config.output_root.display());
    println!("Reports: {}", config.report_dir.display());

    Ok(())
}

fn cmd_audit(common: CommonArgs) -> Result<()> {
    let config = build_config(&common, None)?;
    let _log_guard = start_logging(&common, &config.report_dir, "audit")?;

    let result = run_audit(&config)?;

    println!();
    println!("{}", audit::format_audit_summary(&result.totals));
    println!("Reports: {}", config.report_dir.display());

    Ok(())
}
