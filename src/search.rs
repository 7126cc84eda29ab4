//! `fincite search`: rank the corpus and print citations.

use anyhow::Result;

use fincite_core::models::RankedResults;
use fincite_core::search::{RetrievalService, SearchOptions};

use crate::config::Config;

/// CLI overrides for one search.
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub limit: Option<usize>,
    pub floor: Option<f64>,
    pub multi: bool,
    pub source: Option<String>,
    pub json: bool,
    pub explain: bool,
}

impl SearchArgs {
    pub fn options(&self, config: &Config) -> SearchOptions {
        let mut options = config.search_options();
        if let Some(limit) = self.limit {
            options.limit = limit;
        }
        if let Some(floor) = self.floor {
            options.floor = floor;
        }
        options.allow_multiple_chunks_per_document |= self.multi;
        options.source = self.source.clone();
        options.explain = self.explain;
        options
    }
}

pub fn run_search(
    config: &Config,
    service: &RetrievalService,
    query: &str,
    args: &SearchArgs,
) -> Result<()> {
    let results = service.search(query, &args.options(config))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_human(&results));
    }
    Ok(())
}

pub fn format_human(results: &RankedResults) -> String {
    if results.is_empty() {
        return "No results.\n".to_string();
    }

    let mut out = String::new();
    for (i, citation) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{:.2}] {} (page {})\n",
            i + 1,
            citation.relevance_score,
            citation.source,
            citation.page
        ));
        out.push_str(&format!("    id: {}\n", citation.document_id));
        if !citation.categories.is_empty() {
            let categories: Vec<&str> = citation.categories.iter().map(|c| c.as_str()).collect();
            out.push_str(&format!("    topics: {}\n", categories.join(", ")));
        }
        let excerpt = citation
            .highlighted_excerpt
            .as_deref()
            .unwrap_or(&citation.excerpt);
        out.push_str(&format!(
            "    excerpt: \"{}\"\n",
            excerpt.replace('\n', " ").trim()
        ));
        if let Some(explain) = &citation.explain {
            out.push_str(&format!(
                "    score: raw={:.3} category={:.3} phrase={:.3} terms={:.3}\n",
                explain.raw_score,
                explain.category_overlap,
                explain.exact_phrase,
                explain.term_frequency
            ));
        }
        out.push('\n');
    }
    out
}
