// Archive run: scope discovery, per-file resolution and outcome bookkeeping

use std::collections::HashSet;
use std::fs;

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::metadata::{self, exiftool::MetadataWriter};
use super::discover::{discover_scopes, scan_scope, MediaFile, Scope, SidecarIndex};
use super::file_processor::process_single_file;
use super::matching::{MatchResult, Resolver};
use super::report;
use super::{Outcome, RuleCounts, RunStats, ScopeStats};

/// Process every `Photos from YYYY` scope under the input root, one after
/// another, writing per-scope lists and the run summary to the report dir.
pub fn run_archive(config: &ArchiveConfig, writer: &dyn MetadataWriter) -> Result<RunStats> {
    let resolver = Resolver::new()?;
    let scopes = discover_scopes(&config.input_root)?;
    log::info!("Input path: {}", config.input_root.display());
    log::info!("Output path: {}", config.output_root.display());
    log::info!("Time zone: {}", config.time_zone.name());
    log::info!("Found {} scope folders", scopes.len());
    if scopes.is_empty() {
        log::warn!("No 'Photos from YYYY' folders found in {}", config.input_root.display());
    }

    fs::create_dir_all(&config.report_dir)?;
    let mut run = RunStats::default();

    for scope in &scopes {
        let filter = match config.retry_dir {
            Some(ref dir) => match report::read_retry_filter(dir, &scope.year)? {
                Some(names) => Some(names),
                None => {
                    log::info!(
                        "Skipped file list {} not found. Skipping folder {}.",
                        report::skipped_list_path(dir, &scope.year).display(),
                        scope.name
                    );
                    continue;
                }
            },
            None => None,
        };

        match process_scope(config, scope, &resolver, writer, filter.as_ref()) {
            Ok(stats) => {
                report::write_scope_reports(&config.report_dir, &stats)?;
                run.absorb(stats);
            }
            Err(e) => {
                log::error!("Failed to process {}: {}", scope.path.display(), e);
            }
        }
    }

    report::write_run_summary(&config.report_dir, &run)?;
    log::info!(
        "COMPLETED PROCESSING. Embedded={} Copied only={} Skipped={}",
        run.outcomes.metadata_embedded,
        run.outcomes.copied_only,
        run.outcomes.skipped
    );
    Ok(run)
}

/// Process one scope. With a retry filter only files whose names appear in
/// it are considered.
pub fn process_scope(
    config: &ArchiveConfig,
    scope: &Scope,
    resolver: &Resolver,
    writer: &dyn MetadataWriter,
    retry_filter: Option<&HashSet<String>>,
) -> Result<ScopeStats> {
    log::info!("Processing folder: {}", scope.name);
    let listing = scan_scope(&scope.path)?;
    log::info!(
        "Found {} media files and {} sidecars in {}",
        listing.media.len(),
        listing.sidecars.len(),
        scope.name
    );
    if listing.sidecars.is_empty() && !listing.media.is_empty() {
        log::warn!("No sidecars in {}; every file will be skipped", scope.name);
    }

    let mut stats = ScopeStats::new(scope);

    for media in &listing.media {
        if let Some(filter) = retry_filter {
            if !filter.contains(&media.file_name) {
                continue;
            }
        }

        let outcome = match archive_one(config, resolver, writer, media, &listing.sidecars, &mut stats.rules) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Skipping {}: {}", media.path.display(), e);
                Outcome::Skipped { reason: e.to_string() }
            }
        };
        stats.record(media, outcome);
    }

    log::info!("Folder {} done", scope.name);
    log::info!("  Metadata embedded: {}", stats.outcomes.metadata_embedded);
    log::info!("  Copied only: {}", stats.outcomes.copied_only);
    log::info!("  Skipped: {}", stats.outcomes.skipped);
    Ok(stats)
}

fn archive_one(
    config: &ArchiveConfig,
    resolver: &Resolver,
    writer: &dyn MetadataWriter,
    media: &MediaFile,
    sidecars: &SidecarIndex,
    rules: &mut RuleCounts,
) -> Result<Outcome> {
    let (sidecar, rule) = match resolver.resolve(media, sidecars) {
        MatchResult::Matched { sidecar, rule } => (sidecar, rule),
        MatchResult::Unmatched => return Err(ArchiveError::NoUniqueMatch),
    };
    rules.record(rule);

    let record = metadata::extract(&sidecar.path)?;
    if record.timestamp.is_none() {
        return Err(ArchiveError::MissingTimestamp(sidecar.path.display().to_string()));
    }

    process_single_file(media, &record, config, writer)
}
