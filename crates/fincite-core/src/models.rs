//! Core data models that flow through ingestion and retrieval.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::taxonomy::Category;
use crate::tokenize::{TokenizedText, Tokenizer};

/// One ingested source, split into page chunks. Never mutated after
/// creation; re-ingestion replaces it wholesale.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub chunks: Vec<Chunk>,
    /// SHA-256 of the raw text the document was built from.
    pub content_hash: String,
    pub ingested_at: DateTime<Utc>,
    /// Index generation that published this version of the document.
    pub generation: u64,
}

impl Document {
    pub fn page(&self, page_number: usize) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.page_number == page_number)
    }

    /// Union of all chunk tags.
    pub fn topics(&self) -> BTreeSet<Category> {
        self.chunks
            .iter()
            .flat_map(|c| c.topic_tags.iter().copied())
            .collect()
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            pages: self.chunks.len(),
            topics: self.topics().into_iter().collect(),
            content_hash: self.content_hash.clone(),
            generation: self.generation,
            ingested_at: self.ingested_at,
        }
    }
}

/// Smallest retrievable unit: one page of a document.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub document_id: String,
    /// 1-based, strictly increasing within a document.
    pub page_number: usize,
    pub raw_text: String,
    /// Lowercased `raw_text`, for phrase lookups.
    pub folded_text: String,
    pub tokens: TokenizedText,
    pub topic_tags: BTreeSet<Category>,
    /// SHA-256 of `raw_text`.
    pub hash: String,
}

/// A normalized search query.
#[derive(Debug, Clone)]
pub struct Query {
    pub raw: String,
    pub tokens: TokenizedText,
}

impl Query {
    /// Normalize `raw`; fails with [`Error::InvalidQuery`] when nothing
    /// searchable remains.
    pub fn parse(raw: &str, tokenizer: &Tokenizer) -> Result<Self> {
        let tokens = tokenizer.normalize(raw);
        if tokens.is_empty() {
            return Err(Error::InvalidQuery(raw.to_string()));
        }
        Ok(Self {
            raw: raw.to_string(),
            tokens,
        })
    }
}

/// Scoring signal that contributed to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    CategoryOverlap,
    ExactPhrase,
    TermFrequency,
}

/// Per-signal contributions to a raw score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub category_overlap: f64,
    pub exact_phrase: f64,
    pub term_frequency: f64,
    /// Categories whose overlap signal fired.
    pub categories: BTreeSet<Category>,
    /// Keywords and query terms found in the chunk.
    pub matched_terms: BTreeSet<String>,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.category_overlap + self.exact_phrase + self.term_frequency
    }
}

/// A chunk scored against a query. Borrowed from a corpus snapshot and
/// discarded once a search call returns.
#[derive(Debug, Clone)]
pub struct ScoredMatch<'a> {
    pub document: &'a Document,
    pub chunk: &'a Chunk,
    pub raw_score: f64,
    pub matched_signals: BTreeSet<Signal>,
    pub breakdown: ScoreBreakdown,
}

/// Scoring breakdown attached to a [`Citation`] on request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreExplanation {
    pub raw_score: f64,
    pub category_overlap: f64,
    pub exact_phrase: f64,
    pub term_frequency: f64,
    pub signals: Vec<Signal>,
}

/// A ranked, excerpted, attributed search result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Citation {
    /// Document title.
    pub source: String,
    pub document_id: String,
    pub page: usize,
    pub excerpt: String,
    /// Capped relevance in `[0.0, 1.0]`.
    pub relevance_score: f64,
    pub matched_terms: Vec<String>,
    pub categories: Vec<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted_excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ScoreExplanation>,
}

/// Citations for one query, most relevant first.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedResults {
    pub query: String,
    pub citations: Vec<Citation>,
    /// Number of chunks scored to produce this result.
    pub chunks_scored: usize,
}

impl RankedResults {
    pub fn len(&self) -> usize {
        self.citations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Citation> {
        self.citations.iter()
    }
}

impl IntoIterator for RankedResults {
    type Item = Citation;
    type IntoIter = std::vec::IntoIter<Citation>;

    fn into_iter(self) -> Self::IntoIter {
        self.citations.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedResults {
    type Item = &'a Citation;
    type IntoIter = std::slice::Iter<'a, Citation>;

    fn into_iter(self) -> Self::IntoIter {
        self.citations.iter()
    }
}

/// What an ingestion call did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    Inserted,
    Replaced,
    /// Same id and identical text: the stored document was kept.
    Unchanged,
}

/// Lightweight listing entry for a document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub pages: usize,
    pub topics: Vec<Category>,
    pub content_hash: String,
    pub generation: u64,
    pub ingested_at: DateTime<Utc>,
}

/// Counts over the current corpus snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CorpusStats {
    pub documents: usize,
    pub chunks: usize,
    pub generation: u64,
    /// Tagged chunk count per category, in category order.
    pub chunks_per_category: Vec<(Category, usize)>,
    pub untagged_chunks: usize,
}
