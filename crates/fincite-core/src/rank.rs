//! Floor filtering, ordering, per-document deduplication and truncation.
//!
//! # Algorithm
//!
//! 1. Score every chunk of the snapshot in parallel (optionally only the
//!    documents selected by a source filter).
//! 2. Drop matches whose raw score is `<= floor`.
//! 3. Sort by raw score descending; ties break on `(document_id, page)`
//!    ascending so equal inputs always rank the same way.
//! 4. Unless multiple chunks per document are allowed, keep only the first
//!    (best) chunk of each document, and of each source title: two documents
//!    sharing a title never both appear.
//! 5. Truncate to `limit`.
//!
//! Relevance reported to callers is the raw score clamped to
//! `[0, max_relevance]`; ordering always uses the raw score.

use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::{Chunk, Document, Query, ScoredMatch};
use crate::score::RelevanceScorer;
use crate::store::CorpusSnapshot;

pub const DEFAULT_LIMIT: usize = 3;
/// Must stay at or above every default `phrase_bonus`: a page matching a
/// core phrase only as a substring ("fund" in "fundamentals") scores exactly
/// its bonus and is kept out by the exclusive floor.
pub const DEFAULT_FLOOR: f64 = 0.3;
pub const DEFAULT_MAX_RELEVANCE: f64 = 0.95;

/// Selection knobs for one ranking pass.
#[derive(Debug, Clone, Copy)]
pub struct RankOptions<'o> {
    pub limit: usize,
    pub floor: f64,
    pub allow_multiple_chunks_per_document: bool,
    /// Only rank documents whose id or title equals this value, or whose id
    /// lives under this directory prefix.
    pub source: Option<&'o str>,
}

impl Default for RankOptions<'_> {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            floor: DEFAULT_FLOOR,
            allow_multiple_chunks_per_document: false,
            source: None,
        }
    }
}

/// Output of [`rank`]: the selected matches plus how many chunks were scored.
#[derive(Debug)]
pub struct Ranking<'a> {
    pub matches: Vec<ScoredMatch<'a>>,
    pub chunks_scored: usize,
}

/// Rank every chunk of `snapshot` against `query`.
pub fn rank<'a>(
    scorer: &RelevanceScorer,
    query: &Query,
    snapshot: &'a CorpusSnapshot,
    options: &RankOptions<'_>,
) -> Ranking<'a> {
    let candidates: Vec<(&'a Document, &'a Chunk)> = snapshot
        .all_chunks()
        .filter(|(doc, _)| options.source.map_or(true, |s| source_matches(doc, s)))
        .collect();
    let chunks_scored = candidates.len();

    let mut matches: Vec<ScoredMatch<'a>> = candidates
        .par_iter()
        .map(|&(doc, chunk)| scorer.score(query, doc, chunk))
        .filter(|m| m.raw_score > options.floor)
        .collect();

    matches.sort_by(compare_matches);

    if !options.allow_multiple_chunks_per_document {
        let mut documents: BTreeSet<&str> = BTreeSet::new();
        let mut sources: BTreeSet<&str> = BTreeSet::new();
        matches.retain(|m| {
            let (id, title) = (m.document.id.as_str(), m.document.title.as_str());
            let fresh = !documents.contains(id) && !sources.contains(title);
            if fresh {
                documents.insert(id);
                sources.insert(title);
            }
            fresh
        });
    }

    matches.truncate(options.limit);

    Ranking {
        matches,
        chunks_scored,
    }
}

/// Raw score descending, then `(document_id, page)` ascending.
pub fn compare_matches(a: &ScoredMatch<'_>, b: &ScoredMatch<'_>) -> Ordering {
    b.raw_score
        .total_cmp(&a.raw_score)
        .then_with(|| a.document.id.cmp(&b.document.id))
        .then_with(|| a.chunk.page_number.cmp(&b.chunk.page_number))
}

/// Clamp a raw score into `[0, max_relevance]`.
pub fn cap_relevance(raw_score: f64, max_relevance: f64) -> f64 {
    raw_score.clamp(0.0, max_relevance)
}

fn source_matches(document: &Document, source: &str) -> bool {
    if document.id == source || document.title == source {
        return true;
    }
    let prefix = source.trim_end_matches('/');
    !prefix.is_empty()
        && document
            .id
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Analyzer, PageSplitter};
    use crate::store::memory::InMemoryStore;
    use crate::store::CorpusStore;
    use crate::taxonomy::Taxonomy;
    use crate::tokenize::Tokenizer;
    use chrono::Utc;

    struct Fixture {
        tokenizer: Tokenizer,
        scorer: RelevanceScorer,
        store: InMemoryStore,
    }

    impl Fixture {
        fn new() -> Self {
            let tokenizer = Tokenizer::default();
            let scorer = RelevanceScorer::new(Taxonomy::financial(&tokenizer), 0.02);
            Self {
                tokenizer,
                scorer,
                store: InMemoryStore::new(),
            }
        }

        fn add(&self, id: &str, text: &str) {
            self.add_titled(id, id, text);
        }

        fn add_titled(&self, id: &str, title: &str, text: &str) {
            let splitter = PageSplitter::default();
            let analyzer = Analyzer {
                tokenizer: &self.tokenizer,
                taxonomy: self.scorer.taxonomy(),
                splitter: &splitter,
            };
            let doc = analyzer
                .build_document(id, title, text, 0, Utc::now())
                .unwrap();
            self.store.upsert(doc);
        }

        fn ids(&self, query: &str, options: &RankOptions<'_>) -> Vec<(String, usize)> {
            let query = Query::parse(query, &self.tokenizer).unwrap();
            let snapshot = self.store.snapshot();
            rank(&self.scorer, &query, &snapshot, options)
                .matches
                .iter()
                .map(|m| (m.document.id.clone(), m.chunk.page_number))
                .collect()
        }
    }

    const EMERGENCY: &str = "Keep an emergency fund for unexpected job loss.";

    #[test]
    fn test_floor_is_exclusive() {
        let f = Fixture::new();
        f.add("a", EMERGENCY);
        let query = Query::parse("emergency", &f.tokenizer).unwrap();
        let snapshot = f.store.snapshot();
        let raw = rank(&f.scorer, &query, &snapshot, &RankOptions { floor: 0.0, ..Default::default() })
            .matches[0]
            .raw_score;

        let at_floor = RankOptions {
            floor: raw,
            ..Default::default()
        };
        assert!(rank(&f.scorer, &query, &snapshot, &at_floor).matches.is_empty());
    }

    #[test]
    fn test_one_chunk_per_document_by_default() {
        let f = Fixture::new();
        f.add("a", &format!("{EMERGENCY}\u{0c}{EMERGENCY} Emergency savings."));
        f.add("b", EMERGENCY);

        let ids = f.ids("emergency savings", &RankOptions::default());
        assert_eq!(ids, vec![("a".to_string(), 2), ("b".to_string(), 1)]);

        let all = f.ids(
            "emergency savings",
            &RankOptions {
                allow_multiple_chunks_per_document: true,
                ..Default::default()
            },
        );
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_one_citation_per_source_title_by_default() {
        let f = Fixture::new();
        f.add_titled("guides/budget.txt", "budget.txt", EMERGENCY);
        f.add_titled("archive/budget.txt", "budget.txt", EMERGENCY);
        f.add_titled("other.txt", "other.txt", EMERGENCY);

        let ids = f.ids("emergency", &RankOptions::default());
        assert_eq!(
            ids,
            vec![("archive/budget.txt".to_string(), 1), ("other.txt".to_string(), 1)]
        );

        let all = f.ids(
            "emergency",
            &RankOptions {
                allow_multiple_chunks_per_document: true,
                ..Default::default()
            },
        );
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_ties_break_on_document_then_page() {
        let f = Fixture::new();
        f.add("b", EMERGENCY);
        f.add("a", &format!("{EMERGENCY}\u{0c}{EMERGENCY}"));

        let ids = f.ids(
            "emergency",
            &RankOptions {
                allow_multiple_chunks_per_document: true,
                ..Default::default()
            },
        );
        assert_eq!(
            ids,
            vec![
                ("a".to_string(), 1),
                ("a".to_string(), 2),
                ("b".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_truncates_to_limit() {
        let f = Fixture::new();
        for id in ["a", "b", "c", "d", "e"] {
            f.add(id, EMERGENCY);
        }
        assert_eq!(f.ids("emergency", &RankOptions::default()).len(), 3);
        let one = RankOptions {
            limit: 1,
            ..Default::default()
        };
        assert_eq!(f.ids("emergency", &one), vec![("a".to_string(), 1)]);
    }

    #[test]
    fn test_source_filter() {
        let f = Fixture::new();
        f.add("guides/a.txt", EMERGENCY);
        f.add("guides-old/b.txt", EMERGENCY);
        f.add("c.txt", EMERGENCY);

        let by_dir = RankOptions {
            source: Some("guides/"),
            ..Default::default()
        };
        assert_eq!(f.ids("emergency", &by_dir), vec![("guides/a.txt".to_string(), 1)]);

        let by_id = RankOptions {
            source: Some("c.txt"),
            ..Default::default()
        };
        assert_eq!(f.ids("emergency", &by_id), vec![("c.txt".to_string(), 1)]);
    }

    #[test]
    fn test_phrase_only_match_stays_below_default_floor() {
        for profile in crate::taxonomy::default_profiles().values() {
            assert!(profile.phrase_bonus <= DEFAULT_FLOOR);
        }

        let f = Fixture::new();
        f.add("garden", "Fundamentals of gardening.");
        let query = Query::parse("emergency", &f.tokenizer).unwrap();
        let snapshot = f.store.snapshot();

        let loose = rank(&f.scorer, &query, &snapshot, &RankOptions { floor: 0.0, ..Default::default() });
        assert_eq!(loose.matches.len(), 1);
        assert_eq!(loose.matches[0].raw_score, 0.30);
        assert_eq!(loose.matches[0].breakdown.category_overlap, 0.0);

        assert!(rank(&f.scorer, &query, &snapshot, &RankOptions::default())
            .matches
            .is_empty());
    }

    #[test]
    fn test_cap_relevance() {
        assert_eq!(cap_relevance(0.47, DEFAULT_MAX_RELEVANCE), 0.47);
        assert_eq!(cap_relevance(3.2, DEFAULT_MAX_RELEVANCE), 0.95);
        assert_eq!(cap_relevance(-1.0, DEFAULT_MAX_RELEVANCE), 0.0);
    }
}
