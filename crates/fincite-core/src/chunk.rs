//! Page-boundary chunker.
//!
//! Splits already-extracted document text into page [`Chunk`]s. A page
//! boundary is a form feed (`\f`, what most PDF-to-text tools emit between
//! pages) or a line matching the page-marker pattern, by default
//! `--- Page N ---`.
//!
//! # Algorithm
//!
//! 1. Split the text on form feeds, then split each piece on marker lines.
//! 2. Number the pages by position, starting at 1.
//! 3. Drop blank pages. Their numbers are not reused, so a citation always
//!    points at the page the text came from.
//! 4. Normalize each page once, tag it against the taxonomy and hash it.
//!
//! Text in front of the first marker of a piece (a title line, say) is not a
//! page of its own: it is folded into the page that follows, or dropped when
//! blank. Text without any marker becomes a single page.
//!
//! # Example
//!
//! ```rust
//! use fincite_core::chunk::PageSplitter;
//!
//! let pages = PageSplitter::default().split("--- Page 1 ---\nIntro\n--- Page 2 ---\n\n--- Page 3 ---\nBudgets");
//! let numbered: Vec<(usize, &str)> = pages.iter().map(|p| (p.number, p.text.as_ref())).collect();
//! assert_eq!(numbered, vec![(1, "Intro"), (3, "Budgets")]);
//! ```

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::models::{Chunk, Document};
use crate::taxonomy::Taxonomy;
use crate::tokenize::Tokenizer;

/// Default page-marker pattern: a line like `--- Page 12 ---`.
pub const DEFAULT_PAGE_MARKER: &str = r"(?mi)^[ \t]*-{2,}[ \t]*page[ \t]+\d+[ \t]*-{2,}[ \t\r]*$";

const FORM_FEED: char = '\u{0c}';

/// One non-blank page and its 1-based position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'t> {
    pub number: usize,
    pub text: Cow<'t, str>,
}

/// Splits raw text into pages.
#[derive(Debug, Clone)]
pub struct PageSplitter {
    marker: Regex,
}

impl Default for PageSplitter {
    fn default() -> Self {
        Self {
            marker: Regex::new(DEFAULT_PAGE_MARKER).expect("default page marker is a valid regex"),
        }
    }
}

impl PageSplitter {
    /// Build a splitter from a custom marker pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        let marker = Regex::new(pattern)
            .map_err(|e| Error::InvalidConfig(format!("invalid page marker pattern: {e}")))?;
        Ok(Self { marker })
    }

    /// Non-blank, trimmed pages in source order, numbered by position.
    pub fn split<'t>(&self, text: &'t str) -> Vec<Page<'t>> {
        let mut slots: Vec<Cow<'t, str>> = Vec::new();
        for piece in text.split(FORM_FEED) {
            let mut parts = self.marker.split(piece).map(str::trim);
            let lead = parts.next().unwrap_or_default();
            match parts.next() {
                // No marker: the whole piece is one page.
                None => slots.push(Cow::Borrowed(lead)),
                Some(first) => {
                    slots.push(fold_lead(lead, first));
                    slots.extend(parts.map(Cow::Borrowed));
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .filter(|(_, text)| !text.is_empty())
            .map(|(index, text)| Page {
                number: index + 1,
                text,
            })
            .collect()
    }
}

fn fold_lead<'t>(lead: &'t str, page: &'t str) -> Cow<'t, str> {
    match (lead.is_empty(), page.is_empty()) {
        (true, _) => Cow::Borrowed(page),
        (false, true) => Cow::Borrowed(lead),
        (false, false) => Cow::Owned(format!("{lead}\n{page}")),
    }
}

/// Everything ingestion needs besides the document itself.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer<'a> {
    pub tokenizer: &'a Tokenizer,
    pub taxonomy: &'a Taxonomy,
    pub splitter: &'a PageSplitter,
}

impl Analyzer<'_> {
    /// Build an immutable [`Document`] from raw text.
    ///
    /// Fails with [`Error::EmptyDocument`] when no page has any text.
    pub fn build_document(
        &self,
        id: &str,
        title: &str,
        raw_text: &str,
        generation: u64,
        ingested_at: DateTime<Utc>,
    ) -> Result<Document> {
        let pages = self.splitter.split(raw_text);
        if pages.is_empty() {
            return Err(Error::EmptyDocument { id: id.to_string() });
        }

        let chunks: Vec<Chunk> = pages
            .iter()
            .map(|page| self.make_chunk(id, page.number, &page.text))
            .collect();

        let title = title.trim();
        Ok(Document {
            id: id.to_string(),
            title: if title.is_empty() { id.to_string() } else { title.to_string() },
            chunks,
            content_hash: content_hash(raw_text),
            ingested_at,
            generation,
        })
    }

    fn make_chunk(&self, document_id: &str, page_number: usize, text: &str) -> Chunk {
        let tokens = self.tokenizer.normalize(text);
        let topic_tags = self.taxonomy.tags_for(&tokens);
        Chunk {
            document_id: document_id.to_string(),
            page_number,
            raw_text: text.to_string(),
            folded_text: text.to_lowercase(),
            tokens,
            topic_tags,
            hash: content_hash(text),
        }
    }
}

/// Hex SHA-256 of `text`.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
