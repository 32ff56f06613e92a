//! Fuzzy search index built alongside each snapshot.
//!
//! A query matches a field when all of its characters appear in the field in
//! order, case-insensitively. Matches are scored by compactness: the query
//! length divided by the length of the tightest window containing the
//! subsequence. Exact substrings score 1.0. Fields are weighted title > tag >
//! keyword/description > document body; the best matching field decides.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::{Duration, Instant};
use unicode_normalization::UnicodeNormalization;

/// Search tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Matches looser than this are discarded (0 < x <= 1).
    #[serde(default = "default_min_compactness")]
    pub min_compactness: f64,
    /// Result cap callers apply on top of the ranked list.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_min_compactness() -> f64 {
    0.25
}

fn default_max_results() -> usize {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_compactness: default_min_compactness(),
            max_results: default_max_results(),
        }
    }
}

/// Field tiers, in increasing weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    Body = 1,
    Keyword = 2,
    Tag = 3,
    Title = 4,
}

/// Ranking of one match. Compares by tier of the best field, then by its
/// compactness, then by how many tiers matched at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub field: FieldKind,
    pub compactness: f64,
    pub matched_tiers: u8,
}

impl Score {
    /// Scalar form of the score, always > 0 for a match.
    pub fn value(&self) -> f64 {
        self.field as u8 as f64 + self.compactness
    }
}

impl Eq for Score {}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.field
            .cmp(&other.field)
            .then_with(|| self.compactness.total_cmp(&other.compactness))
            .then_with(|| self.matched_tiers.cmp(&other.matched_tiers))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Searchable text of one node.
#[derive(Debug, Clone, Default)]
pub struct IndexDocument {
    pub url: String,
    pub title: String,
    pub tags: Vec<String>,
    /// Keywords and the description.
    pub keywords: Vec<String>,
    pub bodies: Vec<String>,
}

struct IndexEntry {
    url: String,
    fields: Vec<(FieldKind, Vec<Vec<char>>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub url: String,
    /// `None` for the empty query, which matches everything unscored.
    pub score: Option<Score>,
}

/// Immutable index over one snapshot.
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
    config: SearchConfig,
}

impl SearchIndex {
    /// Build from documents given in tree order (depth-first, sibling order).
    pub fn build(documents: impl IntoIterator<Item = IndexDocument>, config: SearchConfig) -> Self {
        let entries = documents
            .into_iter()
            .map(|doc| IndexEntry {
                url: doc.url,
                fields: vec![
                    (FieldKind::Title, vec![fold(&doc.title)]),
                    (FieldKind::Tag, doc.tags.iter().map(|t| fold(t)).collect()),
                    (FieldKind::Keyword, doc.keywords.iter().map(|k| fold(k)).collect()),
                    (FieldKind::Body, doc.bodies.iter().map(|b| fold(b)).collect()),
                ],
            })
            .collect();
        Self { entries, config }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranked hits for `query` plus the time it took. Ties keep tree order.
    pub fn search(&self, query: &str) -> (Vec<SearchHit>, Duration) {
        let started = Instant::now();
        let query = fold(query.trim());

        let hits = if query.is_empty() {
            self.entries
                .iter()
                .map(|e| SearchHit {
                    url: e.url.clone(),
                    score: None,
                })
                .collect()
        } else {
            let mut scored: Vec<(usize, Score)> = self
                .entries
                .iter()
                .enumerate()
                .filter_map(|(pos, e)| self.score_entry(&query, e).map(|s| (pos, s)))
                .collect();
            scored.sort_by(|(pa, a), (pb, b)| b.cmp(a).then_with(|| pa.cmp(pb)));
            scored
                .into_iter()
                .map(|(pos, score)| SearchHit {
                    url: self.entries[pos].url.clone(),
                    score: Some(score),
                })
                .collect()
        };
        (hits, started.elapsed())
    }

    fn score_entry(&self, query: &[char], entry: &IndexEntry) -> Option<Score> {
        let span = max_span(query.len(), self.config.min_compactness);
        let mut best: Option<Score> = None;
        let mut matched_tiers = 0u8;
        for (kind, values) in &entry.fields {
            let tier_best = values
                .iter()
                .filter_map(|v| compactness(query, v, span))
                .filter(|c| *c >= self.config.min_compactness)
                .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |a| a.max(c))));
            let Some(c) = tier_best else { continue };
            matched_tiers += 1;
            let candidate = Score {
                field: *kind,
                compactness: c,
                matched_tiers: 0,
            };
            if best.map_or(true, |b| candidate > b) {
                best = Some(candidate);
            }
        }
        best.map(|s| Score { matched_tiers, ..s })
    }
}

fn fold(s: &str) -> Vec<char> {
    s.nfc().collect::<String>().to_lowercase().chars().collect()
}

/// Compactness of the tightest ordered-subsequence match of `query` in
/// `field`, or `None` when it does not match within `max_span` characters.
///
/// Each start position scans at most `max_span` characters, so one field
/// costs `O(field.len() * max_span)`.
pub fn compactness(query: &[char], field: &[char], max_span: usize) -> Option<f64> {
    if query.is_empty() || query.len() > field.len() {
        return None;
    }
    if field.windows(query.len()).any(|w| w == query) {
        return Some(1.0);
    }

    let mut best_span: Option<usize> = None;
    for start in 0..field.len() {
        if field[start] != query[0] {
            continue;
        }
        // A window no tighter than the best so far cannot improve it.
        let window = best_span.map_or(max_span, |b| b.saturating_sub(1).min(max_span));
        let limit = field.len().min(start.saturating_add(window));
        let mut qi = 1;
        let mut end = start;
        let mut i = start + 1;
        while qi < query.len() && i < limit {
            if field[i] == query[qi] {
                qi += 1;
                end = i;
            }
            i += 1;
        }
        if qi < query.len() {
            if limit == field.len() {
                // No later start can complete either.
                break;
            }
            continue;
        }
        best_span = Some(end - start + 1);
    }
    best_span.map(|span| query.len() as f64 / span as f64)
}

/// Widest window whose compactness still reaches `min_compactness`.
fn max_span(query_len: usize, min_compactness: f64) -> usize {
    if !(min_compactness > 0.0) {
        return usize::MAX;
    }
    let mut span = (query_len as f64 / min_compactness).floor() as usize;
    while span < usize::MAX && query_len as f64 / (span + 1) as f64 >= min_compactness {
        span += 1;
    }
    span.max(query_len)
}
