// Archive pipeline module

pub mod discover;
pub mod matching;
pub mod placement;
pub mod copy;
pub mod file_processor;
pub mod pipeline;
pub mod report;
pub mod verification;
pub mod audit;


use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use discover::{MediaFile, Scope};
use matching::MatchRule;

pub use audit::{run_audit, AuditReport, AuditStats};
pub use pipeline::{process_scope, run_archive};

/// Summary serializers for paths. Names that are not valid UTF-8 are
/// written lossily instead of failing the whole summary.
pub(crate) mod lossy_path {
    use std::path::{Path, PathBuf};
    use serde::Serializer;

    pub fn one<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&path.to_string_lossy())
    }

    pub fn many<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(paths.iter().map(|p| p.to_string_lossy()))
    }
}

/// What happened to one media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    MetadataEmbedded,
    /// Copied with a timestamp-only update. `embed_error` is set when the
    /// writer was invoked and failed.
    CopiedOnly { embed_error: Option<String> },
    /// Left untouched; nothing was written to the archive.
    Skipped { reason: String },
}

/// Match counts indexed by rule number - 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCounts([usize; 8]);

impl RuleCounts {
    pub fn record(&mut self, rule: MatchRule) {
        self.0[rule.number() - 1] += 1;
    }

    pub fn get(&self, rule: MatchRule) -> usize {
        self.0[rule.number() - 1]
    }

    pub fn add(&mut self, other: &RuleCounts) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            *mine += theirs;
        }
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MatchRule, usize)> + '_ {
        MatchRule::ALL.into_iter().map(move |r| (r, self.get(r)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub total_media: usize,
    pub metadata_embedded: usize,
    pub copied_only: usize,
    pub skipped: usize,
    /// Copied-only files whose embed attempt failed
    pub embed_failures: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: &Outcome) {
        self.total_media += 1;
        match outcome {
            Outcome::MetadataEmbedded => self.metadata_embedded += 1,
            Outcome::CopiedOnly { embed_error } => {
                self.copied_only += 1;
                if embed_error.is_some() {
                    self.embed_failures += 1;
                }
            }
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn add(&mut self, other: &OutcomeCounts) {
        self.total_media += other.total_media;
        self.metadata_embedded += other.metadata_embedded;
        self.copied_only += other.copied_only;
        self.skipped += other.skipped;
        self.embed_failures += other.embed_failures;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    #[serde(serialize_with = "lossy_path::one")]
    pub path: PathBuf,
    pub reason: String,
}

/// Counters and file lists for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeStats {
    pub scope: String,
    pub year: String,
    pub outcomes: OutcomeCounts,
    pub rules: RuleCounts,
    pub skipped: Vec<SkippedEntry>,
    #[serde(serialize_with = "lossy_path::many")]
    pub copied_only: Vec<PathBuf>,
}

impl ScopeStats {
    pub fn new(scope: &Scope) -> Self {
        Self {
            scope: scope.name.clone(),
            year: scope.year.clone(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, media: &MediaFile, outcome: Outcome) {
        self.outcomes.record(&outcome);
        match outcome {
            Outcome::MetadataEmbedded => {}
            Outcome::CopiedOnly { .. } => self.copied_only.push(media.path.clone()),
            Outcome::Skipped { reason } => self.skipped.push(SkippedEntry {
                path: media.path.clone(),
                reason,
            }),
        }
    }
}

/// Run-wide totals plus the per-scope breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub outcomes: OutcomeCounts,
    pub rules: RuleCounts,
    pub scopes: Vec<ScopeStats>,
}

impl RunStats {
    pub fn absorb(&mut self, scope: ScopeStats) {
        self.outcomes.add(&scope.outcomes);
        self.rules.add(&scope.rules);
        self.scopes.push(scope);
    }
}
