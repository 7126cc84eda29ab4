//! Corpus overview: `fincite stats` and `fincite documents`.

use anyhow::Result;

use fincite_core::models::{CorpusStats, DocumentSummary};
use fincite_core::search::RetrievalService;

use crate::config::Config;
use crate::ingest::IngestReport;

pub fn run_stats(
    config: &Config,
    service: &RetrievalService,
    report: &IngestReport,
    json: bool,
) -> Result<()> {
    let stats = service.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    print!("{}", format_stats(config, &stats, report));
    Ok(())
}

pub fn run_documents(service: &RetrievalService, json: bool) -> Result<()> {
    let docs = service.documents();
    if json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
        return Ok(());
    }
    print!("{}", format_documents(&docs));
    Ok(())
}

fn format_stats(config: &Config, stats: &CorpusStats, report: &IngestReport) -> String {
    let mut out = String::new();
    out.push_str("fincite corpus stats\n");
    out.push_str("====================\n\n");
    out.push_str(&format!("  Corpus:      {}\n", config.corpus.root.display()));
    out.push_str(&format!("  Documents:   {}\n", stats.documents));
    out.push_str(&format!("  Pages:       {}\n", stats.chunks));
    out.push_str(&format!("  Skipped:     {}\n", report.skipped));
    out.push_str(&format!("  Untagged:    {}\n", stats.untagged_chunks));
    out.push_str("\n  By topic:\n");
    out.push_str(&format!("  {:<20} {:>6}\n", "TOPIC", "PAGES"));
    out.push_str(&format!("  {}\n", "-".repeat(27)));
    for (category, count) in &stats.chunks_per_category {
        out.push_str(&format!("  {:<20} {:>6}\n", category.as_str(), count));
    }
    out.push('\n');
    out
}

fn format_documents(docs: &[DocumentSummary]) -> String {
    if docs.is_empty() {
        return "No documents.\n".to_string();
    }
    let mut out = String::new();
    out.push_str(&format!("{:<40} {:>5}   {}\n", "ID", "PAGES", "TOPICS"));
    for doc in docs {
        let topics: Vec<&str> = doc.topics.iter().map(|c| c.as_str()).collect();
        out.push_str(&format!(
            "{:<40} {:>5}   {}\n",
            doc.id,
            doc.pages,
            topics.join(", ")
        ));
    }
    out
}
