// Sidecar resolution: pairs a media file with its takeout JSON sidecar

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use super::discover::{MediaFile, SidecarCandidate, SidecarIndex};
use crate::constants::{JSON_LENGTH_LIMIT, JSON_TRUNCATION_MARGIN, LIVE_PHOTO_STILL_EXTENSIONS, RULE_NAMES};
use crate::error::{ArchiveError, Result};

/// Resolution rules in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MatchRule {
    Direct = 1,
    Truncated = 2,
    Parenthetical = 3,
    Edited = 4,
    LivePhoto = 5,
    LivePhotoDuplicate = 6,
    PngFallback = 7,
    Title = 8,
}

impl MatchRule {
    pub const ALL: [MatchRule; 8] = [
        MatchRule::Direct,
        MatchRule::Truncated,
        MatchRule::Parenthetical,
        MatchRule::Edited,
        MatchRule::LivePhoto,
        MatchRule::LivePhotoDuplicate,
        MatchRule::PngFallback,
        MatchRule::Title,
    ];

    /// 1-based rule number
    pub fn number(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        RULE_NAMES[self.number() - 1]
    }
}

#[derive(Debug, Clone, Copy)]
pub enum MatchResult<'a> {
    Matched {
        sidecar: &'a SidecarCandidate,
        rule: MatchRule,
    },
    Unmatched,
}

/// Holds the compiled media-name patterns. Build once per run.
#[derive(Debug, Clone)]
pub struct Resolver {
    parenthetical: Regex,
    edited: Regex,
    live_duplicate: Regex,
}

impl Resolver {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parenthetical: build_pattern(r"^(.+)\((\d+)\)(\.[^.]+)$")?,
            edited: build_pattern(r"^(.*)-edited(\.[^.]+)$")?,
            live_duplicate: build_pattern(r"^(.+)\(\d+\)\.mp4$")?,
        })
    }

    /// Try every rule in order and stop at the first one with exactly one
    /// candidate. A rule with several candidates is a miss.
    pub fn resolve<'a>(&self, media: &MediaFile, index: &'a SidecarIndex) -> MatchResult<'a> {
        let lower = media.file_name.to_lowercase();

        for rule in MatchRule::ALL {
            let found = self.candidates_for(rule, &media.file_name, &lower, index);
            match found.len() {
                0 => continue,
                1 => {
                    let sidecar = found[0];
                    log::info!(
                        "JSON match - Rule {} ({}): {} -> {}",
                        rule.number(),
                        rule.name(),
                        media.file_name,
                        sidecar.file_name
                    );
                    return MatchResult::Matched { sidecar, rule };
                }
                n => {
                    log::debug!(
                        "Rule {} ({}) ambiguous for {}: {} candidates",
                        rule.number(),
                        rule.name(),
                        media.file_name,
                        n
                    );
                }
            }
        }

        MatchResult::Unmatched
    }

    fn candidates_for<'a>(
        &self,
        rule: MatchRule,
        name: &str,
        lower: &str,
        index: &'a SidecarIndex,
    ) -> Vec<&'a SidecarCandidate> {
        let all = index.candidates();
        match rule {
            MatchRule::Direct => {
                let exact = format!("{}.json", lower);
                let exact_hits = filter_names(all, |n| n == exact);
                if exact_hits.is_empty() {
                    filter_names(all, |n| has_affixes(n, lower, ".json"))
                } else {
                    exact_hits
                }
            }
            MatchRule::Truncated => match truncated_prefix(name) {
                Some(prefix) => filter_names(all, |n| n.starts_with(&prefix)),
                None => Vec::new(),
            },
            MatchRule::Parenthetical => match self.parenthetical.captures(lower) {
                Some(caps) => {
                    let prefix = format!("{}{}", &caps[1], &caps[3]);
                    let suffix = format!("({}).json", &caps[2]);
                    filter_names(all, |n| has_affixes(n, &prefix, &suffix))
                }
                None => Vec::new(),
            },
            MatchRule::Edited => match self.edited.captures(lower) {
                Some(caps) => {
                    let stem = format!("{}{}", &caps[1], &caps[2]);
                    filter_names(all, |n| has_affixes(n, &stem, ".json"))
                }
                None => Vec::new(),
            },
            MatchRule::LivePhoto => match lower.strip_suffix(".mp4") {
                Some(base) => still_sidecars(all, base),
                None => Vec::new(),
            },
            MatchRule::LivePhotoDuplicate => match self.live_duplicate.captures(lower) {
                Some(caps) => still_sidecars(all, &caps[1]),
                None => Vec::new(),
            },
            MatchRule::PngFallback => match lower.strip_suffix(".png") {
                Some(base) => {
                    let wanted = format!("{}.json", base);
                    filter_names(all, |n| n == wanted)
                }
                None => Vec::new(),
            },
            // Only rule that opens sidecar bodies; titles compare case-sensitively
            MatchRule::Title => all
                .iter()
                .filter(|c| c.title() == Some(name))
                .collect(),
        }
    }
}

fn build_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ArchiveError::Other(format!("Bad match pattern {}: {}", pattern, e)))
}

/// Lowercased name prefix kept by a truncated sidecar name, or None when
/// `<name>.json` fits within the limit.
fn truncated_prefix(name: &str) -> Option<String> {
    if name.chars().count() + ".json".len() <= JSON_LENGTH_LIMIT {
        return None;
    }
    let prefix: String = name.chars().take(JSON_LENGTH_LIMIT - JSON_TRUNCATION_MARGIN).collect();
    Some(prefix.to_lowercase())
}

fn filter_names<'a, F>(all: &'a [SidecarCandidate], pred: F) -> Vec<&'a SidecarCandidate>
where
    F: Fn(&str) -> bool,
{
    all.iter().filter(|c| pred(c.lower_name())).collect()
}

/// `prefix` and `suffix` must not overlap inside `name`.
fn has_affixes(name: &str, prefix: &str, suffix: &str) -> bool {
    name.len() >= prefix.len() + suffix.len() && name.starts_with(prefix) && name.ends_with(suffix)
}

/// Sidecars of the still image paired with a live photo video.
fn still_sidecars<'a>(all: &'a [SidecarCandidate], base: &str) -> Vec<&'a SidecarCandidate> {
    let wanted: Vec<String> = LIVE_PHOTO_STILL_EXTENSIONS
        .iter()
        .map(|ext| format!("{}.{}.json", base, ext))
        .collect();
    filter_names(all, |n| wanted.iter().any(|w| w == n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn media(name: &str) -> MediaFile {
        MediaFile {
            path: PathBuf::from("/scope").join(name),
            name: name.into(),
            file_name: name.to_string(),
            extension: crate::ingest::discover::lowercase_extension(Path::new(name)),
            size: 0,
            modified: None,
        }
    }

    fn index(names: &[&str]) -> SidecarIndex {
        SidecarIndex::new(names.iter().map(|n| PathBuf::from("/scope").join(n)).collect()).unwrap()
    }

    fn matched(result: MatchResult<'_>) -> Option<(String, usize)> {
        match result {
            MatchResult::Matched { sidecar, rule } => Some((sidecar.file_name.clone(), rule.number())),
            MatchResult::Unmatched => None,
        }
    }

    #[test]
    fn test_rule_names() {
        assert_eq!(MatchRule::Direct.name(), "direct");
        assert_eq!(MatchRule::Title.number(), 8);
        assert_eq!(MatchRule::Title.name(), "via JSON title");
    }

    #[test]
    fn test_direct_match_case_insensitive() {
        let resolver = Resolver::new().unwrap();
        let idx = index(&["img_0001.JPG.json", "other.jpg.json"]);
        assert_eq!(
            matched(resolver.resolve(&media("IMG_0001.jpg"), &idx)),
            Some(("img_0001.JPG.json".to_string(), 1))
        );
    }

    #[test]
    fn test_direct_prefers_exact_over_prefix() {
        let resolver = Resolver::new().unwrap();
        let idx = index(&["IMG_0001.jpg.json", "IMG_0001.jpg.supplemental-metadata.json"]);
        assert_eq!(
            matched(resolver.resolve(&media("IMG_0001.jpg"), &idx)),
            Some(("IMG_0001.jpg.json".to_string(), 1))
        );

        let idx = index(&["IMG_0001.jpg.supplemental-metadata.json"]);
        assert_eq!(
            matched(resolver.resolve(&media("IMG_0001.jpg"), &idx)).map(|m| m.1),
            Some(1)
        );
    }

    #[test]
    fn test_truncated_match() {
        let resolver = Resolver::new().unwrap();
        let name = "A_very_long_file_name_exported_by_google_photos_2021.jpg";
        assert!(name.len() + 5 > JSON_LENGTH_LIMIT);
        let truncated = format!("{}.json", &name[..45]);
        let idx = index(&[truncated.as_str()]);
        assert_eq!(matched(resolver.resolve(&media(name), &idx)), Some((truncated.clone(), 2)));

        // Short names never use the truncation rule
        let idx = index(&["short.j.json"]);
        assert_eq!(matched(resolver.resolve(&media("short.jpg"), &idx)), None);
    }

    #[test]
    fn test_truncation_boundary() {
        // 45 chars + ".json" is exactly the limit
        let at_limit = "abcdefghij_abcdefghij_abcdefghij_abcdefghij.j";
        assert_eq!(at_limit.chars().count() + 5, JSON_LENGTH_LIMIT);
        assert_eq!(truncated_prefix(at_limit), None);

        let over = "ABCDEFGHIJ_abcdefghij_abcdefghij_abcdefghij.jp";
        assert_eq!(truncated_prefix(over).as_deref(), Some(&over.to_lowercase()[..45]));

        // Counted in characters, not bytes
        let wide = "é".repeat(45);
        assert_eq!(truncated_prefix(&wide), None);
        let wider = "é".repeat(46);
        assert_eq!(truncated_prefix(&wider), Some("é".repeat(45)));

        let resolver = Resolver::new().unwrap();
        let sidecar = format!("{}.json", &over[..45]);
        let idx = index(&[sidecar.as_str()]);
        assert_eq!(matched(resolver.resolve(&media(over), &idx)), Some((sidecar.clone(), 2)));
    }

    #[test]
    fn test_parenthetical_match() {
        let resolver = Resolver::new().unwrap();
        let idx = index(&["IMG_0002.jpg(1).json", "IMG_0002.jpg(2).json"]);
        assert_eq!(
            matched(resolver.resolve(&media("IMG_0002(1).jpg"), &idx)),
            Some(("IMG_0002.jpg(1).json".to_string(), 3))
        );
    }

    #[test]
    fn test_edited_match() {
        let resolver = Resolver::new().unwrap();
        let idx = index(&["IMG_0003.jpg.json"]);
        assert_eq!(
            matched(resolver.resolve(&media("IMG_0003-EDITED.jpg"), &idx)),
            Some(("IMG_0003.jpg.json".to_string(), 4))
        );
    }

    #[test]
    fn test_live_photo_matches() {
        let resolver = Resolver::new().unwrap();
        let idx = index(&["VID_0002.JPG.json"]);
        assert_eq!(
            matched(resolver.resolve(&media("VID_0002.mp4"), &idx)),
            Some(("VID_0002.JPG.json".to_string(), 5))
        );

        let idx = index(&["VID_0004.HEIC.json"]);
        assert_eq!(
            matched(resolver.resolve(&media("VID_0004(1).MP4"), &idx)),
            Some(("VID_0004.HEIC.json".to_string(), 6))
        );
    }

    #[test]
    fn test_png_fallback() {
        let resolver = Resolver::new().unwrap();
        let idx = index(&["Screenshot_1.json"]);
        assert_eq!(
            matched(resolver.resolve(&media("Screenshot_1.png"), &idx)),
            Some(("Screenshot_1.json".to_string(), 7))
        );
    }

    #[test]
    fn test_title_match_and_priority() {
        let tmp = tempfile::TempDir::new().unwrap();
        let direct = tmp.path().join("IMG_0005.jpg.json");
        let titled = tmp.path().join("renamed.json");
        fs::write(&direct, r#"{"title": "IMG_0005.jpg"}"#).unwrap();
        fs::write(&titled, r#"{"title": "IMG_0005.jpg"}"#).unwrap();
        let resolver = Resolver::new().unwrap();

        // Qualifies for rules 1 and 8; rule 1 wins without opening any body
        let idx = SidecarIndex::new(vec![direct.clone(), titled.clone()]).unwrap();
        assert_eq!(matched(resolver.resolve(&media("IMG_0005.jpg"), &idx)).map(|m| m.1), Some(1));
        assert!(idx.candidates().iter().all(|c| !c.body_inspected()));

        let idx = SidecarIndex::new(vec![titled]).unwrap();
        assert_eq!(
            matched(resolver.resolve(&media("IMG_0005.jpg"), &idx)),
            Some(("renamed.json".to_string(), 8))
        );
        // Title comparison is exact
        assert_eq!(matched(resolver.resolve(&media("img_0005.jpg"), &idx)), None);
    }

    #[test]
    fn test_ambiguity_is_miss() {
        let resolver = Resolver::new().unwrap();

        // Two prefix hits for rule 1, nothing later applies
        let idx = index(&["IMG_0006.jpg.a.json", "IMG_0006.jpg.b.json"]);
        assert_eq!(matched(resolver.resolve(&media("IMG_0006.jpg"), &idx)), None);

        // Ambiguous rule 5 (both stills) falls through to the unique rule 6 hit
        let idx = index(&["VID(1).jpg.json", "VID(1).heic.json", "VID.jpg.json"]);
        assert_eq!(
            matched(resolver.resolve(&media("VID(1).mp4"), &idx)),
            Some(("VID.jpg.json".to_string(), 6))
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = Resolver::new().unwrap();
        let idx = index(&["b.jpg.json", "a.jpg.json", "IMG_0007.jpg(1).json", "IMG_0007.jpg.json"]);
        let m = media("IMG_0007(1).jpg");
        let first = matched(resolver.resolve(&m, &idx));
        for _ in 0..5 {
            assert_eq!(matched(resolver.resolve(&m, &idx)), first);
        }
        assert_eq!(first, Some(("IMG_0007.jpg(1).json".to_string(), 3)));
    }
}
