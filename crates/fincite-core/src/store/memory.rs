//! In-memory [`CorpusStore`] with copy-on-write snapshots.
//!
//! The current snapshot sits behind an `RwLock<Arc<_>>`. Readers hold the
//! read lock only long enough to clone the `Arc`, then score against their
//! own immutable view. Writers are serialized by a separate mutex, build
//! the next snapshot off to the side and swap it in with a single store.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use super::{CorpusSnapshot, CorpusStore};
use crate::models::Document;

/// In-memory corpus index.
pub struct InMemoryStore {
    current: RwLock<Arc<CorpusSnapshot>>,
    writer: Mutex<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(CorpusSnapshot::empty())),
            writer: Mutex::new(()),
        }
    }

    fn publish(&self, next: CorpusSnapshot) {
        let generation = next.generation();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        debug!(generation, "published corpus snapshot");
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusStore for InMemoryStore {
    fn snapshot(&self) -> Arc<CorpusSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn upsert(&self, document: Document) -> Option<Arc<Document>> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let (next, previous) = self.snapshot().with_document(document);
        self.publish(next);
        previous
    }

    fn remove(&self, id: &str) -> Option<Arc<Document>> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let (next, removed) = self.snapshot().without_document(id)?;
        self.publish(next);
        Some(removed)
    }
}
