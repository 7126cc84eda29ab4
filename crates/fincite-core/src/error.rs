//! Error types for the retrieval engine.
//!
//! Every error here is local and recoverable by the caller. "No matches" is
//! never an error: it is an empty [`RankedResults`](crate::models::RankedResults).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The query normalized to an empty token set (empty, whitespace or
    /// punctuation only, or nothing but stopwords).
    #[error("invalid query: {0:?} contains no searchable terms")]
    InvalidQuery(String),

    /// Ingestion produced zero non-blank pages.
    #[error("document {id:?} has no extractable text")]
    EmptyDocument { id: String },

    /// Engine settings failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
