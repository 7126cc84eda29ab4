use std::collections::BTreeSet;

use fincite_core::search::{RetrievalService, SearchOptions};
use proptest::prelude::*;

const WORDS: &[&str] = &[
    "emergency", "fund", "funds", "savings", "budget", "50/30/20", "spending", "income",
    "investment", "diversification", "portfolio", "index", "debt", "credit", "loan", "interest",
    "insurance", "premium", "retirement", "roth", "job", "loss", "weather", "garden", "river",
    "monthly", "plan", "account",
];

fn page() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 1..25).prop_map(|w| w.join(" "))
}

fn corpus() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(page(), 1..4), 1..6)
}

fn query() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 1..4).prop_map(|w| w.join(" "))
}

fn build(docs: &[Vec<String>]) -> RetrievalService {
    let service = RetrievalService::default();
    for (i, pages) in docs.iter().enumerate() {
        let id = format!("doc-{i}");
        service
            .ingest_document(&id, &format!("{id}.pdf"), &pages.join("\u{0c}"))
            .unwrap();
    }
    service
}

fn wide(floor: f64) -> SearchOptions {
    SearchOptions {
        limit: 1000,
        floor,
        allow_multiple_chunks_per_document: true,
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn results_respect_limit_cap_and_order(docs in corpus(), q in query(), limit in 1usize..5) {
        let service = build(&docs);
        let options = SearchOptions { limit, ..Default::default() };
        let results = service.search(&q, &options).unwrap();

        prop_assert!(results.len() <= limit);
        for c in &results {
            prop_assert!(c.relevance_score >= 0.0 && c.relevance_score <= 0.95);
        }
        for pair in results.citations.windows(2) {
            prop_assert!(pair[0].relevance_score >= pair[1].relevance_score);
        }
    }

    #[test]
    fn default_mode_cites_each_document_once(docs in corpus(), q in query()) {
        let service = build(&docs);
        let options = SearchOptions { limit: 100, ..Default::default() };
        let results = service.search(&q, &options).unwrap();
        let ids: BTreeSet<&str> = results.iter().map(|c| c.document_id.as_str()).collect();
        let sources: BTreeSet<&str> = results.iter().map(|c| c.source.as_str()).collect();
        prop_assert_eq!(ids.len(), results.len());
        prop_assert_eq!(sources.len(), results.len());
    }

    #[test]
    fn every_citation_clears_the_floor(docs in corpus(), q in query(), floor in 0.0f64..0.8) {
        let service = build(&docs);
        let options = SearchOptions { explain: true, ..wide(floor) };
        let results = service.search(&q, &options).unwrap();
        for c in &results {
            let explain = c.explain.as_ref().unwrap();
            prop_assert!(explain.raw_score > floor);
            prop_assert!(c.relevance_score > 0.0);
        }
    }

    #[test]
    fn raising_the_floor_only_removes_results(docs in corpus(), q in query(), low in 0.0f64..0.5, bump in 0.0f64..0.5) {
        let service = build(&docs);
        let key = |c: &fincite_core::models::Citation| (c.document_id.clone(), c.page);
        let loose: BTreeSet<_> = service.search(&q, &wide(low)).unwrap().iter().map(key).collect();
        let strict: BTreeSet<_> = service.search(&q, &wide(low + bump)).unwrap().iter().map(key).collect();
        prop_assert!(strict.is_subset(&loose));
    }

    #[test]
    fn search_is_repeatable(docs in corpus(), q in query()) {
        let service = build(&docs);
        let first = service.search(&q, &SearchOptions::default()).unwrap();
        let second = service.search(&q, &SearchOptions::default()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn reingesting_same_text_is_a_no_op(docs in corpus(), q in query()) {
        let once = build(&docs);
        let twice = build(&docs);
        for (i, pages) in docs.iter().enumerate() {
            let id = format!("doc-{i}");
            twice.ingest_document(&id, &format!("{id}.pdf"), &pages.join("\u{0c}")).unwrap();
        }
        prop_assert_eq!(
            once.search(&q, &SearchOptions::default()).unwrap(),
            twice.search(&q, &SearchOptions::default()).unwrap()
        );
    }
}
