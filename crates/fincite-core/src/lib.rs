//! # fincite core
//!
//! Lexical relevance scoring, ranking and citation extraction over a corpus
//! of financial documents: tokenizer, topic taxonomy, page chunker,
//! copy-on-write corpus index, scorer, ranker, citation builder and the
//! [`RetrievalService`](search::RetrievalService) facade.
//!
//! This crate does no I/O and spawns no async runtime. Callers hand it
//! already-extracted text and get back plain, serializable values.
//!
//! ```rust
//! use fincite_core::search::{RetrievalService, SearchOptions};
//!
//! let service = RetrievalService::default();
//! service
//!     .ingest_document("guide", "Guide.pdf", "Emergency funds are essential for financial security.")
//!     .unwrap();
//! let results = service.search("emergency fund", &SearchOptions::default()).unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results.citations[0].page, 1);
//! ```

pub mod chunk;
pub mod citation;
pub mod error;
pub mod models;
pub mod rank;
pub mod score;
pub mod search;
pub mod store;
pub mod taxonomy;
pub mod tokenize;

pub use error::{Error, Result};
