//! Corpus index abstraction.
//!
//! The [`CorpusStore`] trait is the seam between the retrieval pipeline and
//! wherever documents live. Readers work on an immutable [`CorpusSnapshot`];
//! writers publish a whole new snapshot, so a search either sees every chunk
//! of a document version or none of them.
//!
//! Implementations must be `Send + Sync`: searches run concurrently with
//! each other and with ingestion.

pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{Chunk, Document};

/// Immutable view of the corpus at one generation.
#[derive(Debug, Clone, Default)]
pub struct CorpusSnapshot {
    documents: BTreeMap<String, Arc<Document>>,
    generation: u64,
}

impl CorpusSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of mutations published before this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn document(&self, id: &str) -> Option<&Arc<Document>> {
        self.documents.get(id)
    }

    /// Documents ordered by id.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values().map(Arc::as_ref)
    }

    /// Chunks of one document in page order; empty if the id is unknown.
    pub fn chunks_of(&self, document_id: &str) -> &[Chunk] {
        self.documents
            .get(document_id)
            .map(|d| d.chunks.as_slice())
            .unwrap_or(&[])
    }

    /// Every chunk with its owning document, ordered by
    /// `(document_id, page_number)`. Each call starts a fresh pass.
    pub fn all_chunks(&self) -> impl Iterator<Item = (&Document, &Chunk)> {
        self.documents()
            .flat_map(|doc| doc.chunks.iter().map(move |chunk| (doc, chunk)))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.documents.values().map(|d| d.chunks.len()).sum()
    }

    /// Copy-on-write: a new snapshot with `document` inserted or replaced.
    /// The document is stamped with the new generation.
    pub(crate) fn with_document(&self, mut document: Document) -> (Self, Option<Arc<Document>>) {
        let generation = self.generation + 1;
        document.generation = generation;
        let mut documents = self.documents.clone();
        let previous = documents.insert(document.id.clone(), Arc::new(document));
        (
            Self {
                documents,
                generation,
            },
            previous,
        )
    }

    /// Copy-on-write: a new snapshot without `id`, or `None` if absent.
    pub(crate) fn without_document(&self, id: &str) -> Option<(Self, Arc<Document>)> {
        if !self.documents.contains_key(id) {
            return None;
        }
        let mut documents = self.documents.clone();
        let removed = documents.remove(id)?;
        Some((
            Self {
                documents,
                generation: self.generation + 1,
            },
            removed,
        ))
    }
}

/// Abstract corpus index.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`snapshot`](CorpusStore::snapshot) | Current immutable view, for readers |
/// | [`upsert`](CorpusStore::upsert) | Insert or atomically replace a document |
/// | [`remove`](CorpusStore::remove) | Delete a document (no-op if absent) |
pub trait CorpusStore: Send + Sync {
    /// The most recently published snapshot.
    fn snapshot(&self) -> Arc<CorpusSnapshot>;

    /// Publish `document`, replacing any document with the same id.
    /// Returns the replaced version.
    fn upsert(&self, document: Document) -> Option<Arc<Document>>;

    /// Remove a document. Returns the removed version, `None` if absent.
    fn remove(&self, id: &str) -> Option<Arc<Document>>;
}
