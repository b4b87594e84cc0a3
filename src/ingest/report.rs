// Report files: skip-lists, copied-only lists and run summaries

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    COPIED_ONLY_LIST_SUFFIX, RUN_SUMMARY_FILE, RUN_SUMMARY_JSON, SCOPE_SUMMARY_SUFFIX,
    SKIPPED_LIST_SUFFIX,
};
use crate::error::Result;
use super::{OutcomeCounts, RuleCounts, RunStats, ScopeStats};

const LABEL_WIDTH: usize = 40;

/// Write one line per entry. The file is replaced even when `lines` is empty.
pub fn write_lines<I, S>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut content = String::new();
    for line in lines {
        content.push_str(line.as_ref());
        content.push('\n');
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

pub fn skipped_list_path(dir: &Path, year: &str) -> PathBuf {
    dir.join(format!("{}{}", year, SKIPPED_LIST_SUFFIX))
}

/// Read a skip-list written by an earlier run. Returns the bare file names,
/// or None when the scope has no list in `dir`.
pub fn read_retry_filter(dir: &Path, year: &str) -> Result<Option<HashSet<String>>> {
    let path = skipped_list_path(dir, year);
    if !path.is_file() {
        return Ok(None);
    }

    let names: HashSet<String> = fs::read_to_string(&path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| Path::new(l).file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    Ok(Some(names))
}

/// Write `<YYYY>_skipped_files.txt`, `<YYYY>_copied_only.txt` and `<YYYY>_summary.txt`.
pub fn write_scope_reports(dir: &Path, stats: &ScopeStats) -> Result<()> {
    let skipped_path = skipped_list_path(dir, &stats.year);
    write_lines(&skipped_path, stats.skipped.iter().map(|s| s.path.display().to_string()))?;
    log::info!("Skipped list written to {}", skipped_path.display());

    let copied_path = dir.join(format!("{}{}", stats.year, COPIED_ONLY_LIST_SUFFIX));
    write_lines(&copied_path, stats.copied_only.iter().map(|p| p.display().to_string()))?;
    log::info!("Copied only list written to {}", copied_path.display());

    let summary_path = dir.join(format!("{}{}", stats.year, SCOPE_SUMMARY_SUFFIX));
    fs::write(&summary_path, format_scope_summary(stats))?;
    Ok(())
}

/// Write `run_summary.txt` and `run_summary.json`.
pub fn write_run_summary(dir: &Path, run: &RunStats) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(RUN_SUMMARY_FILE), format_run_summary(run))?;
    fs::write(dir.join(RUN_SUMMARY_JSON), serde_json::to_string_pretty(run)?)?;
    log::info!("Run summary written to {}", dir.join(RUN_SUMMARY_FILE).display());
    Ok(())
}

pub fn format_scope_summary(stats: &ScopeStats) -> String {
    let mut out = format!("SCOPE {} SUMMARY\n", stats.scope);
    out.push_str(&"=".repeat(50));
    out.push('\n');
    push_counts(&mut out, &stats.outcomes, &stats.rules);

    if !stats.skipped.is_empty() {
        out.push_str("\nSkipped files:\n");
        for entry in &stats.skipped {
            out.push_str(&format!("  {} | {}\n", entry.path.display(), entry.reason));
        }
    }
    out
}

pub fn format_run_summary(run: &RunStats) -> String {
    let mut out = String::from("RUN SUMMARY\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');
    push_counts(&mut out, &run.outcomes, &run.rules);

    if !run.scopes.is_empty() {
        out.push_str("\nPer scope (embedded / copied only / skipped):\n");
        for scope in &run.scopes {
            out.push_str(&format!(
                "  {:<24}{:>8} {:>8} {:>8}\n",
                scope.scope,
                scope.outcomes.metadata_embedded,
                scope.outcomes.copied_only,
                scope.outcomes.skipped
            ));
        }
    }
    out
}

fn push_counts(out: &mut String, outcomes: &OutcomeCounts, rules: &RuleCounts) {
    push_row(out, "Total media files:", outcomes.total_media);
    push_row(out, "Metadata embedded:", outcomes.metadata_embedded);
    push_row(out, "Copied only:", outcomes.copied_only);
    push_row(out, "  of which embed failed:", outcomes.embed_failures);
    push_row(out, "Skipped:", outcomes.skipped);
    out.push_str("\nMatches per rule:\n");
    push_row(out, "All rules:", rules.total());
    for (rule, count) in rules.iter() {
        push_row(out, &format!("Rule {} ({}):", rule.number(), rule.name()), count);
    }
}

pub(crate) fn push_row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    out.push_str(&format!("  {:<width$}{:>8}\n", label, value, width = LABEL_WIDTH));
}
