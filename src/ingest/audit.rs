// Archive audit: re-derives every placement independently and reports divergences
//
// Writes per scope (prefixed with the scope year):
// - _validation_result_not_present.txt: expected archive entries that are missing
// - _validation_result_size_mismatch.txt: input, output and reason per entry
// - _validation_result_invalid_date.txt: month-folder files with a foreign mtime
// - _validation_result_orphan_json.txt: sidecars no media file claimed
// - _validation_result_orphan_json_url.txt: bare source URLs of those sidecars
// - _validation_summary.txt
// and validation_summary.txt / validation_summary.json for the whole run.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::config::ArchiveConfig;
use crate::constants::{
    AUDIT_INVALID_DATE_SUFFIX, AUDIT_NOT_PRESENT_SUFFIX, AUDIT_ORPHAN_SUFFIX, AUDIT_ORPHAN_URL_SUFFIX,
    AUDIT_SCOPE_SUMMARY_SUFFIX, AUDIT_SIZE_MISMATCH_SUFFIX, AUDIT_SUMMARY_FILE, AUDIT_SUMMARY_JSON,
    ORPHAN_FOLDER,
};
use crate::error::{ArchiveError, Result};
use crate::metadata;
use super::discover::{discover_scopes, scan_scope, MediaFile, Scope};
use super::matching::{MatchResult, Resolver};
use super::placement::archive_location;
use super::report::{push_row, write_lines};
use super::verification::{check_size_band, find_invalid_dates};
use super::lossy_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeMismatch {
    #[serde(serialize_with = "lossy_path::one")]
    pub input: PathBuf,
    #[serde(serialize_with = "lossy_path::one")]
    pub output: PathBuf,
    pub reason: String,
}

/// Audit findings for one scope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditStats {
    pub scope: String,
    pub year: String,
    pub total_media: usize,
    pub found: usize,
    pub size_ok: usize,
    #[serde(serialize_with = "lossy_path::many")]
    pub missing: Vec<PathBuf>,
    /// Media for which no archive location could be derived
    #[serde(serialize_with = "lossy_path::many")]
    pub unresolved: Vec<PathBuf>,
    pub size_mismatches: Vec<SizeMismatch>,
    #[serde(serialize_with = "lossy_path::many")]
    pub invalid_dates: Vec<PathBuf>,
    #[serde(serialize_with = "lossy_path::many")]
    pub orphans: Vec<PathBuf>,
    pub orphan_urls: Vec<String>,
}

impl AuditStats {
    fn new(scope: &Scope) -> Self {
        Self {
            scope: scope.name.clone(),
            year: scope.year.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditTotals {
    pub total_media: usize,
    pub missing: usize,
    pub size_mismatched: usize,
    pub invalid_dates: usize,
    pub orphans: usize,
    pub errors: usize,
    pub size_ok: usize,
}

impl AuditTotals {
    pub fn add(&mut self, stats: &AuditStats) {
        self.total_media += stats.total_media;
        self.missing += stats.missing.len();
        self.size_mismatched += stats.size_mismatches.len();
        self.invalid_dates += stats.invalid_dates.len();
        self.orphans += stats.orphans.len();
        self.errors += stats.unresolved.len();
        self.size_ok += stats.size_ok;
    }

    /// Share of media whose archived copy exists within the size band, in percent.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_media == 0 {
            None
        } else {
            Some(self.size_ok as f64 / self.total_media as f64 * 100.0)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub totals: AuditTotals,
    pub success_rate: Option<f64>,
    pub scopes: Vec<AuditStats>,
    /// Date findings in archive year folders that no input scope covers
    #[serde(serialize_with = "lossy_path::many")]
    pub unscoped_invalid_dates: Vec<PathBuf>,
}

/// Audit every scope under the input root against the archive.
pub fn run_audit(config: &ArchiveConfig) -> Result<AuditReport> {
    if !config.output_root.is_dir() {
        return Err(ArchiveError::InvalidPath(format!(
            "Output path does not exist: {}",
            config.output_root.display()
        )));
    }

    let resolver = Resolver::new()?;
    let scopes = discover_scopes(&config.input_root)?;
    log::info!("Starting audit of {}", config.output_root.display());
    log::info!("Found {} scope folders to audit", scopes.len());
    if scopes.is_empty() {
        log::warn!("No 'Photos from YYYY' folders found in {}", config.input_root.display());
    }

    fs::create_dir_all(&config.report_dir)?;
    let mut report = AuditReport::default();

    for scope in &scopes {
        let stats = match audit_scope(config, scope, &resolver) {
            Ok(s) => s,
            Err(e) => {
                log::error!("Failed to audit {}: {}", scope.path.display(), e);
                continue;
            }
        };
        quarantine_orphans(&config.report_dir, &stats);
        write_scope_results(&config.report_dir, &stats)?;
        report.totals.add(&stats);
        report.scopes.push(stats);
    }

    // Capture dates shift across the year boundary in local time, so the
    // archive can hold year folders no input scope is named after
    let scope_years: HashSet<String> = report.scopes.iter().map(|s| s.year.clone()).collect();
    for year in archive_years(&config.output_root)? {
        if scope_years.contains(&year) {
            continue;
        }
        let invalid = find_invalid_dates(&config.output_root, &year, &config.time_zone)?;
        for file in &invalid {
            log::warn!("Invalid modified date: {}", file.display());
        }
        write_invalid_dates(&config.report_dir, &year, &invalid)?;
        report.totals.invalid_dates += invalid.len();
        report.unscoped_invalid_dates.extend(invalid);
    }

    report.success_rate = report.totals.success_rate();

    fs::write(config.report_dir.join(AUDIT_SUMMARY_FILE), format_audit_summary(&report.totals))?;
    fs::write(config.report_dir.join(AUDIT_SUMMARY_JSON), serde_json::to_string_pretty(&report)?)?;
    log::info!("Audit summary written to {}", config.report_dir.join(AUDIT_SUMMARY_FILE).display());

    Ok(report)
}

/// Audit one scope: existence, size band, month-folder dates and orphans.
pub fn audit_scope(config: &ArchiveConfig, scope: &Scope, resolver: &Resolver) -> Result<AuditStats> {
    log::info!("Auditing folder: {}", scope.name);
    let listing = scan_scope(&scope.path)?;
    let mut stats = AuditStats::new(scope);
    let mut consumed: HashSet<&Path> = HashSet::new();

    for media in &listing.media {
        stats.total_media += 1;

        let expected = match resolver.resolve(media, &listing.sidecars) {
            MatchResult::Matched { sidecar, .. } => {
                consumed.insert(sidecar.path.as_path());
                expected_location(config, media, &sidecar.path)
            }
            MatchResult::Unmatched => None,
        };

        let expected = match expected {
            Some(p) => p,
            None => {
                log::warn!("Could not determine output path for: {}", media.path.display());
                stats.unresolved.push(media.path.clone());
                continue;
            }
        };

        let output_size = match fs::metadata(&expected) {
            Ok(m) if m.is_file() => m.len(),
            _ => {
                log::warn!(
                    "Missing in output: {} (expected at: {})",
                    media.file_name,
                    expected.display()
                );
                stats.missing.push(media.path.clone());
                continue;
            }
        };
        stats.found += 1;

        let check = check_size_band(media.size, output_size);
        if check.ok {
            stats.size_ok += 1;
            log::debug!("Size match: {} - {}", media.file_name, check.reason);
        } else {
            log::warn!("Size mismatch: {} - {}", media.file_name, check.reason);
            stats.size_mismatches.push(SizeMismatch {
                input: media.path.clone(),
                output: expected,
                reason: check.reason,
            });
        }
    }

    for candidate in listing.sidecars.candidates() {
        if consumed.contains(candidate.path.as_path()) {
            continue;
        }
        stats.orphans.push(candidate.path.clone());
        if let Some(url) = metadata::read_url(&candidate.path) {
            stats.orphan_urls.push(url);
        }
    }
    if !stats.orphans.is_empty() {
        log::info!("{} orphan sidecars in {}", stats.orphans.len(), scope.name);
    }

    stats.invalid_dates = find_invalid_dates(&config.output_root, &scope.year, &config.time_zone)?;
    for file in &stats.invalid_dates {
        log::warn!("Invalid modified date: {}", file.display());
    }

    Ok(stats)
}

fn expected_location(config: &ArchiveConfig, media: &MediaFile, sidecar: &Path) -> Option<PathBuf> {
    let record = match metadata::extract(sidecar) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("{}", e);
            return None;
        }
    };
    archive_location(&config.output_root, &media.name, record.timestamp?, &config.time_zone)
}

/// Copy orphan sidecars into `<report_dir>/orphan_json/<scope name>/`.
fn quarantine_orphans(report_dir: &Path, stats: &AuditStats) {
    if stats.orphans.is_empty() {
        return;
    }
    let folder = report_dir.join(ORPHAN_FOLDER).join(&stats.scope);
    if let Err(e) = fs::create_dir_all(&folder) {
        log::warn!("Failed to create {}: {}", folder.display(), e);
        return;
    }

    for orphan in &stats.orphans {
        let name = match orphan.file_name() {
            Some(n) => n,
            None => continue,
        };
        let dest = folder.join(name);
        match fs::copy(orphan, &dest) {
            Ok(_) => log::info!("Copied orphan JSON {} to {}", orphan.display(), dest.display()),
            Err(e) => log::warn!("Failed to copy orphan JSON {}: {}", orphan.display(), e),
        }
    }
}

fn write_scope_results(dir: &Path, stats: &AuditStats) -> Result<()> {
    let file = |suffix: &str| dir.join(format!("{}{}", stats.year, suffix));
    let rule = "=".repeat(50);

    let mut not_present = vec![format!("Missing output files for year {}", stats.year), rule.clone()];
    not_present.extend(stats.missing.iter().map(|p| p.display().to_string()));
    not_present.extend(
        stats.unresolved.iter().map(|p| format!("{} (no archive location)", p.display())),
    );
    write_lines(&file(AUDIT_NOT_PRESENT_SUFFIX), &not_present)?;

    let mut mismatched = vec![format!("Mismatched files for year {}", stats.year), rule.clone()];
    for m in &stats.size_mismatches {
        mismatched.push(format!("Input:  {}", m.input.display()));
        mismatched.push(format!("Output: {}", m.output.display()));
        mismatched.push(format!("Reason: {}", m.reason));
        mismatched.push(String::new());
    }
    write_lines(&file(AUDIT_SIZE_MISMATCH_SUFFIX), &mismatched)?;

    write_invalid_dates(dir, &stats.year, &stats.invalid_dates)?;

    let mut orphans = vec![format!("Orphan JSON files for year {}", stats.year), rule];
    orphans.extend(stats.orphans.iter().map(|p| p.display().to_string()));
    write_lines(&file(AUDIT_ORPHAN_SUFFIX), &orphans)?;

    write_lines(&file(AUDIT_ORPHAN_URL_SUFFIX), &stats.orphan_urls)?;

    let mut totals = AuditTotals::default();
    totals.add(stats);
    let summary = format!("YEAR {} SUMMARY\n{}", stats.year, format_counts(&totals));
    fs::write(file(AUDIT_SCOPE_SUMMARY_SUFFIX), summary)?;
    Ok(())
}

fn write_invalid_dates(dir: &Path, year: &str, files: &[PathBuf]) -> Result<()> {
    let mut lines = vec![
        format!("Files in {}/MM with invalid modified date", year),
        "=".repeat(50),
    ];
    lines.extend(files.iter().map(|p| p.display().to_string()));
    write_lines(&dir.join(format!("{}{}", year, AUDIT_INVALID_DATE_SUFFIX)), &lines)
}

/// Four-digit year folders directly under the archive root, sorted.
fn archive_years(output_root: &Path) -> Result<Vec<String>> {
    let mut years: Vec<String> = fs::read_dir(output_root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.len() == 4 && n.bytes().all(|b| b.is_ascii_digit()))
        .collect();
    years.sort();
    Ok(years)
}

fn format_counts(totals: &AuditTotals) -> String {
    let mut out = String::new();
    push_row(&mut out, "Total media files:", totals.total_media);
    push_row(&mut out, "Test 1: Output files not present:", totals.missing);
    push_row(&mut out, "Test 2: Output file size mismatch:", totals.size_mismatched);
    push_row(&mut out, "Test 3: Output file modified date invalid:", totals.invalid_dates);
    push_row(&mut out, "Test 4: Orphan JSON files:", totals.orphans);
    push_row(&mut out, "Errors:", totals.errors);
    if let Some(rate) = totals.success_rate() {
        push_row(&mut out, "Success rate:", format!("{:.1}%", rate));
    }
    out
}

/// Aggregate summary as written to `validation_summary.txt`.
pub fn format_audit_summary(totals: &AuditTotals) -> String {
    let mut out = String::from("OVERALL VALIDATION SUMMARY\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');
    out.push_str(&format_counts(totals));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let totals = AuditTotals {
            total_media: 4,
            size_ok: 3,
            ..Default::default()
        };
        assert_eq!(totals.success_rate(), Some(75.0));
        assert_eq!(AuditTotals::default().success_rate(), None);
        assert!(format_audit_summary(&totals).contains("75.0%"));
    }

    #[test]
    fn test_totals_add() {
        let stats = AuditStats {
            total_media: 3,
            size_ok: 1,
            missing: vec![PathBuf::from("a.jpg")],
            unresolved: vec![PathBuf::from("b.jpg")],
            orphans: vec![PathBuf::from("c.json"), PathBuf::from("d.json")],
            ..Default::default()
        };
        let mut totals = AuditTotals::default();
        totals.add(&stats);
        totals.add(&stats);
        assert_eq!(totals.total_media, 6);
        assert_eq!(totals.missing, 2);
        assert_eq!(totals.errors, 2);
        assert_eq!(totals.orphans, 4);
    }
}
