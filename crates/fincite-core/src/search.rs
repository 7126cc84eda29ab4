//! Retrieval service: the facade that ties ingestion, scoring, ranking and
//! citation building together.
//!
//! The service works entirely through the [`CorpusStore`] trait and holds no
//! I/O or configuration-file dependencies. The calling application builds
//! [`EngineSettings`] (usually from its config file), constructs a
//! [`RetrievalService`], feeds it documents and runs searches.
//!
//! # Search flow
//!
//! 1. Validate [`SearchOptions`] and normalize the query. A query with no
//!    searchable tokens is rejected with [`Error::InvalidQuery`].
//! 2. Take an immutable snapshot of the corpus.
//! 3. Score, filter, sort, deduplicate and truncate (see [`crate::rank`]).
//! 4. Build one [`Citation`](crate::models::Citation) per surviving match.
//!
//! A valid query with no match above the floor yields empty
//! [`RankedResults`], not an error.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::chunk::{Analyzer, PageSplitter};
use crate::citation::{CitationBuilder, CitationConfig};
use crate::error::{Error, Result};
use crate::models::{CorpusStats, Document, DocumentSummary, IngestOutcome, Query, RankedResults};
use crate::rank::{self, RankOptions, DEFAULT_FLOOR, DEFAULT_LIMIT, DEFAULT_MAX_RELEVANCE};
use crate::score::{RelevanceScorer, DEFAULT_TERM_WEIGHT};
use crate::store::memory::InMemoryStore;
use crate::store::{CorpusSnapshot, CorpusStore};
use crate::taxonomy::{default_profiles, Category, CategoryProfile, Taxonomy};
use crate::tokenize::{Tokenizer, TokenizerConfig};

/// Engine construction settings, decoupled from application config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub tokenizer: TokenizerConfig,
    pub taxonomy: BTreeMap<Category, CategoryProfile>,
    /// Weight per distinct token shared by query and chunk.
    pub term_weight: f64,
    /// Upper bound on reported relevance, in `(0, 1]`.
    pub max_relevance: f64,
    pub citations: CitationConfig,
    /// Page-marker regex; `None` uses the built-in `--- Page N ---` pattern.
    pub page_marker: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerConfig::default(),
            taxonomy: default_profiles(),
            term_weight: DEFAULT_TERM_WEIGHT,
            max_relevance: DEFAULT_MAX_RELEVANCE,
            citations: CitationConfig::default(),
            page_marker: None,
        }
    }
}

/// Per-call search parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchOptions {
    /// Maximum citations returned.
    pub limit: usize,
    /// Matches must score strictly above this.
    pub floor: f64,
    pub allow_multiple_chunks_per_document: bool,
    /// Restrict to one document (id or title) or a directory of ids.
    pub source: Option<String>,
    /// Attach a score breakdown to each citation.
    pub explain: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            floor: DEFAULT_FLOOR,
            allow_multiple_chunks_per_document: false,
            source: None,
            explain: false,
        }
    }
}

impl SearchOptions {
    pub fn validate(&self) -> Result<()> {
        if self.limit < 1 {
            return Err(Error::InvalidConfig("limit must be >= 1".to_string()));
        }
        if !self.floor.is_finite() || self.floor < 0.0 {
            return Err(Error::InvalidConfig(
                "floor must be a finite number >= 0".to_string(),
            ));
        }
        Ok(())
    }

    fn rank_options(&self) -> RankOptions<'_> {
        RankOptions {
            limit: self.limit,
            floor: self.floor,
            allow_multiple_chunks_per_document: self.allow_multiple_chunks_per_document,
            source: self.source.as_deref(),
        }
    }
}

/// Ingests documents and answers queries with ranked citations.
///
/// Safe to share across threads: searches take their own snapshot and
/// never block each other; ingestion and deletion are serialized by the
/// store.
pub struct RetrievalService<S: CorpusStore = InMemoryStore> {
    tokenizer: Tokenizer,
    scorer: RelevanceScorer,
    splitter: PageSplitter,
    citations: CitationBuilder,
    store: S,
}

impl RetrievalService<InMemoryStore> {
    /// Service over a fresh in-memory store.
    pub fn new(settings: &EngineSettings) -> Result<Self> {
        Self::with_store(settings, InMemoryStore::new())
    }
}

impl Default for RetrievalService<InMemoryStore> {
    fn default() -> Self {
        let tokenizer = Tokenizer::default();
        let taxonomy = Taxonomy::financial(&tokenizer);
        Self {
            scorer: RelevanceScorer::new(taxonomy, DEFAULT_TERM_WEIGHT),
            tokenizer,
            splitter: PageSplitter::default(),
            citations: CitationBuilder::default(),
            store: InMemoryStore::new(),
        }
    }
}

impl<S: CorpusStore> RetrievalService<S> {
    /// Service over any [`CorpusStore`]. Validates `settings`.
    pub fn with_store(settings: &EngineSettings, store: S) -> Result<Self> {
        if !settings.term_weight.is_finite() || settings.term_weight < 0.0 {
            return Err(Error::InvalidConfig(
                "term_weight must be a finite number >= 0".to_string(),
            ));
        }
        if !(settings.max_relevance > 0.0 && settings.max_relevance <= 1.0) {
            return Err(Error::InvalidConfig(
                "max_relevance must be in (0, 1]".to_string(),
            ));
        }

        let tokenizer = Tokenizer::new(&settings.tokenizer);
        let taxonomy = Taxonomy::new(&settings.taxonomy, &tokenizer)?;
        let splitter = match &settings.page_marker {
            Some(pattern) => PageSplitter::new(pattern)?,
            None => PageSplitter::default(),
        };
        let citations = CitationBuilder::new(settings.citations.clone(), settings.max_relevance)?;

        Ok(Self {
            scorer: RelevanceScorer::new(taxonomy, settings.term_weight),
            tokenizer,
            splitter,
            citations,
            store,
        })
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        self.scorer.taxonomy()
    }

    /// Current corpus snapshot.
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        self.store.snapshot()
    }

    /// Split, normalize and tag `raw_text`, then publish it under `id`,
    /// atomically replacing any previous version.
    ///
    /// Re-ingesting identical text and title is a no-op reported as
    /// [`IngestOutcome::Unchanged`].
    pub fn ingest_document(&self, id: &str, title: &str, raw_text: &str) -> Result<IngestOutcome> {
        let analyzer = Analyzer {
            tokenizer: &self.tokenizer,
            taxonomy: self.scorer.taxonomy(),
            splitter: &self.splitter,
        };
        let document = analyzer.build_document(id, title, raw_text, 0, Utc::now())?;

        if let Some(existing) = self.store.snapshot().document(id) {
            if existing.content_hash == document.content_hash && existing.title == document.title {
                debug!(id, "document unchanged, skipping");
                return Ok(IngestOutcome::Unchanged);
            }
        }

        let pages = document.chunks.len();
        match self.store.upsert(document) {
            Some(previous) => {
                info!(
                    id,
                    pages,
                    previous_pages = previous.chunks.len(),
                    "replaced document"
                );
                Ok(IngestOutcome::Replaced)
            }
            None => {
                debug!(id, pages, "ingested document");
                Ok(IngestOutcome::Inserted)
            }
        }
    }

    /// Remove a document and all its chunks. Returns `false` if it was not
    /// present; deleting twice is not an error.
    pub fn delete_document(&self, id: &str) -> bool {
        let removed = self.store.remove(id).is_some();
        if removed {
            info!(id, "deleted document");
        }
        removed
    }

    /// Rank the corpus against `query` and build citations.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<RankedResults> {
        options.validate()?;
        let query = Query::parse(query, &self.tokenizer)?;
        let snapshot = self.store.snapshot();

        let ranking = rank::rank(&self.scorer, &query, &snapshot, &options.rank_options());
        let citations: Vec<_> = ranking
            .matches
            .iter()
            .map(|m| self.citations.build(m, options.explain))
            .collect();

        debug!(
            query = %query.raw,
            generation = snapshot.generation(),
            chunks_scored = ranking.chunks_scored,
            results = citations.len(),
            "search complete"
        );

        Ok(RankedResults {
            query: query.raw,
            citations,
            chunks_scored: ranking.chunks_scored,
        })
    }

    pub fn document(&self, id: &str) -> Option<Arc<Document>> {
        self.store.snapshot().document(id).cloned()
    }

    /// Summaries of every document, ordered by id.
    pub fn documents(&self) -> Vec<DocumentSummary> {
        self.store
            .snapshot()
            .documents()
            .map(Document::summary)
            .collect()
    }

    pub fn stats(&self) -> CorpusStats {
        let snapshot = self.store.snapshot();
        let mut per_category: BTreeMap<Category, usize> = BTreeMap::new();
        let mut untagged = 0;
        for (_, chunk) in snapshot.all_chunks() {
            if chunk.topic_tags.is_empty() {
                untagged += 1;
            }
            for tag in &chunk.topic_tags {
                *per_category.entry(*tag).or_default() += 1;
            }
        }

        CorpusStats {
            documents: snapshot.len(),
            chunks: snapshot.chunk_count(),
            generation: snapshot.generation(),
            chunks_per_category: self
                .taxonomy()
                .iter()
                .map(|c| (c.category, per_category.get(&c.category).copied().unwrap_or(0)))
                .collect(),
            untagged_chunks: untagged,
        }
    }
}
