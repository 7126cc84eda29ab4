//! Lexical relevance scoring of one chunk against one query.
//!
//! A raw score is the sum of three signals:
//!
//! 1. **Category overlap**: for every category the query names through at
//!    least one representative keyword, and that the chunk is tagged with,
//!    add `weight × |keywords present in both|`.
//! 2. **Exact phrase**: for every category the query names, add the
//!    category's `phrase_bonus` once if the chunk's lowercased text contains
//!    one of its core phrases.
//! 3. **Term frequency**: `term_weight × |query tokens ∩ chunk tokens|`.
//!
//! Scoring is a pure function of its inputs. It holds no state between
//! calls and is safe to run from many threads at once.

use std::collections::BTreeSet;

use crate::models::{Chunk, Document, Query, ScoreBreakdown, ScoredMatch, Signal};
use crate::taxonomy::Taxonomy;

/// Default weight per distinct token shared by query and chunk.
pub const DEFAULT_TERM_WEIGHT: f64 = 0.02;

/// Scores chunks with a fixed taxonomy and term weight.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    taxonomy: Taxonomy,
    term_weight: f64,
}

impl RelevanceScorer {
    pub fn new(taxonomy: Taxonomy, term_weight: f64) -> Self {
        Self {
            taxonomy,
            term_weight,
        }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn term_weight(&self) -> f64 {
        self.term_weight
    }

    /// Score `chunk` (owned by `document`) against `query`.
    pub fn score<'a>(&self, query: &Query, document: &'a Document, chunk: &'a Chunk) -> ScoredMatch<'a> {
        let mut breakdown = ScoreBreakdown::default();
        let mut signals = BTreeSet::new();

        for category in self.taxonomy.iter() {
            let query_keywords: Vec<_> = category.keywords_in(&query.tokens).collect();
            if query_keywords.is_empty() {
                continue;
            }

            if chunk.topic_tags.contains(&category.category) {
                let shared: Vec<&str> = query_keywords
                    .iter()
                    .filter(|k| k.is_in(&chunk.tokens))
                    .map(|k| k.text.as_str())
                    .collect();
                if !shared.is_empty() {
                    breakdown.category_overlap += category.weight * shared.len() as f64;
                    breakdown.categories.insert(category.category);
                    breakdown
                        .matched_terms
                        .extend(shared.into_iter().map(str::to_string));
                }
            }

            if category.phrase_bonus > 0.0 && category.phrase_in(&chunk.folded_text).is_some() {
                breakdown.exact_phrase += category.phrase_bonus;
                signals.insert(Signal::ExactPhrase);
            }
        }

        let shared_tokens: Vec<&str> = query.tokens.shared(&chunk.tokens).collect();
        if !shared_tokens.is_empty() {
            breakdown.term_frequency = self.term_weight * shared_tokens.len() as f64;
            signals.insert(Signal::TermFrequency);
            breakdown
                .matched_terms
                .extend(shared_tokens.into_iter().map(str::to_string));
        }

        if breakdown.category_overlap > 0.0 {
            signals.insert(Signal::CategoryOverlap);
        }

        ScoredMatch {
            document,
            chunk,
            raw_score: breakdown.total(),
            matched_signals: signals,
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Analyzer, PageSplitter};
    use crate::taxonomy::{Category, CategoryProfile};
    use crate::tokenize::Tokenizer;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn doc(tokenizer: &Tokenizer, taxonomy: &Taxonomy, text: &str) -> Document {
        let splitter = PageSplitter::default();
        Analyzer {
            tokenizer,
            taxonomy,
            splitter: &splitter,
        }
        .build_document("guide", "Guide.pdf", text, 1, Utc::now())
        .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_emergency_fund_query() {
        let tokenizer = Tokenizer::default();
        let scorer = RelevanceScorer::new(Taxonomy::financial(&tokenizer), DEFAULT_TERM_WEIGHT);
        let document = doc(
            &tokenizer,
            scorer.taxonomy(),
            "Emergency funds are essential for financial security.",
        );
        let query = Query::parse("emergency fund", &tokenizer).unwrap();

        let m = scorer.score(&query, &document, &document.chunks[0]);
        // "emergency" is the only keyword shared; "funds" is not "fund".
        assert!(approx(m.breakdown.category_overlap, 0.15));
        assert!(approx(m.breakdown.exact_phrase, 0.30));
        assert!(approx(m.breakdown.term_frequency, 0.02));
        assert!(approx(m.raw_score, 0.47));
        assert_eq!(
            m.matched_signals.iter().copied().collect::<Vec<_>>(),
            vec![Signal::CategoryOverlap, Signal::ExactPhrase, Signal::TermFrequency]
        );
        assert!(m.breakdown.categories.contains(&Category::EmergencyFund));
        assert!(m.breakdown.matched_terms.contains("emergency"));
    }

    #[test]
    fn test_unrelated_query_scores_zero() {
        let tokenizer = Tokenizer::default();
        let scorer = RelevanceScorer::new(Taxonomy::financial(&tokenizer), DEFAULT_TERM_WEIGHT);
        let document = doc(&tokenizer, scorer.taxonomy(), "Index funds spread market risk.");
        let query = Query::parse("xyzzy plugh", &tokenizer).unwrap();

        let m = scorer.score(&query, &document, &document.chunks[0]);
        assert_eq!(m.raw_score, 0.0);
        assert!(m.matched_signals.is_empty());
        assert!(m.breakdown.matched_terms.is_empty());
    }

    #[test]
    fn test_phrase_bonus_needs_query_category() {
        let tokenizer = Tokenizer::default();
        let scorer = RelevanceScorer::new(Taxonomy::financial(&tokenizer), DEFAULT_TERM_WEIGHT);
        let document = doc(&tokenizer, scorer.taxonomy(), "A budget keeps spending in check.");

        // Query names investing only: no budgeting phrase bonus.
        let query = Query::parse("portfolio check", &tokenizer).unwrap();
        let m = scorer.score(&query, &document, &document.chunks[0]);
        assert_eq!(m.breakdown.exact_phrase, 0.0);
        assert!(approx(m.raw_score, 0.02));
    }

    #[test]
    fn test_phrase_bonus_once_per_category() {
        let tokenizer = Tokenizer::default();
        let scorer = RelevanceScorer::new(Taxonomy::financial(&tokenizer), DEFAULT_TERM_WEIGHT);
        let document = doc(
            &tokenizer,
            scorer.taxonomy(),
            "Build a budget with the 50/30/20 rule. Budget monthly.",
        );
        let query = Query::parse("budget 50/30/20", &tokenizer).unwrap();
        let m = scorer.score(&query, &document, &document.chunks[0]);
        assert!(approx(m.breakdown.exact_phrase, 0.25));
        assert!(approx(m.breakdown.category_overlap, 0.24));
        assert!(approx(m.breakdown.term_frequency, 0.04));
    }

    #[test]
    fn test_synthetic_weights() {
        let tokenizer = Tokenizer::default();
        let profiles = BTreeMap::from([(
            Category::Debt,
            CategoryProfile {
                keywords: vec!["loan".into(), "credit".into()],
                weight: 1.0,
                phrases: vec!["credit card".into()],
                phrase_bonus: 10.0,
            },
        )]);
        let taxonomy = Taxonomy::new(&profiles, &tokenizer).unwrap();
        let scorer = RelevanceScorer::new(taxonomy, 0.5);
        let document = doc(&tokenizer, scorer.taxonomy(), "Credit card and loan balances.");
        let query = Query::parse("loan credit", &tokenizer).unwrap();

        let m = scorer.score(&query, &document, &document.chunks[0]);
        assert!(approx(m.breakdown.category_overlap, 2.0));
        assert!(approx(m.breakdown.exact_phrase, 10.0));
        assert!(approx(m.breakdown.term_frequency, 1.0));
        assert!(approx(m.raw_score, 13.0));
    }

    #[test]
    fn test_scores_are_deterministic() {
        let tokenizer = Tokenizer::default();
        let scorer = RelevanceScorer::new(Taxonomy::financial(&tokenizer), DEFAULT_TERM_WEIGHT);
        let document = doc(
            &tokenizer,
            scorer.taxonomy(),
            "Pay down high-interest debt before investing in index funds.",
        );
        let query = Query::parse("debt or investing first?", &tokenizer).unwrap();
        let a = scorer.score(&query, &document, &document.chunks[0]);
        let b = scorer.score(&query, &document, &document.chunks[0]);
        assert_eq!(a.raw_score, b.raw_score);
        assert_eq!(a.breakdown, b.breakdown);
    }
}
