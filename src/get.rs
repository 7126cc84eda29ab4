//! Document retrieval by id.
//!
//! Prints a document's metadata followed by each page chunk with its topic
//! tags. Used by `fincite get`.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use fincite_core::search::RetrievalService;
use fincite_core::taxonomy::Category;

/// Full document view, also printed as JSON with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    pub content_hash: String,
    pub ingested_at: DateTime<Utc>,
    pub generation: u64,
    pub pages: Vec<PageResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageResponse {
    pub page: usize,
    pub topics: Vec<Category>,
    pub text: String,
}

pub fn get_document(service: &RetrievalService, id: &str) -> Result<DocumentResponse> {
    let Some(doc) = service.document(id) else {
        bail!("document not found: {}", id);
    };

    let summary = doc.summary();
    Ok(DocumentResponse {
        id: summary.id,
        title: summary.title,
        content_hash: summary.content_hash,
        ingested_at: summary.ingested_at,
        generation: summary.generation,
        pages: doc
            .chunks
            .iter()
            .map(|c| PageResponse {
                page: c.page_number,
                topics: c.topic_tags.iter().copied().collect(),
                text: c.raw_text.clone(),
            })
            .collect(),
    })
}

pub fn run_get(service: &RetrievalService, id: &str, json: bool) -> Result<()> {
    let doc = get_document(service, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("--- Document ---");
    println!("id:           {}", doc.id);
    println!("title:        {}", doc.title);
    println!("sha256:       {}", doc.content_hash);
    println!(
        "ingested_at:  {}",
        doc.ingested_at.format("%Y-%m-%dT%H:%M:%SZ")
    );
    println!();

    println!("--- Pages ({}) ---", doc.pages.len());
    for page in &doc.pages {
        let topics: Vec<&str> = page.topics.iter().map(|c| c.as_str()).collect();
        if topics.is_empty() {
            println!("[page {}]", page.page);
        } else {
            println!("[page {}] {}", page.page, topics.join(", "));
        }
        println!("{}", page.text);
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_document() {
        let service = RetrievalService::default();
        service
            .ingest_document("plan.md", "plan.md", "Intro\u{0c}Set a budget.")
            .unwrap();

        let doc = get_document(&service, "plan.md").unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert!(doc.pages[0].topics.is_empty());
        assert_eq!(doc.pages[1].topics, vec![Category::Budgeting]);
        assert_eq!(doc.content_hash.len(), 64);

        let json = serde_json::to_value(&doc).unwrap();
        let stamp: DateTime<Utc> = json["ingested_at"].as_str().unwrap().parse().unwrap();
        assert_eq!(stamp, doc.ingested_at);

        let err = get_document(&service, "missing.md").unwrap_err();
        assert!(err.to_string().contains("document not found"));
    }
}
