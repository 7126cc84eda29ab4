//! # fincite
//!
//! Command-line front end for the `fincite-core` retrieval engine: scans a
//! directory of extracted financial documents, ingests them into an
//! in-memory corpus index and answers queries with ranked, attributed
//! citations.
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌───────────────┐
//! │ corpus dir  │──▶│ tokenize + chunk │──▶│ corpus index  │
//! │ *.txt *.md  │   │ + topic tagging  │   │ (snapshots)   │
//! └─────────────┘   └──────────────────┘   └──────┬────────┘
//!                                                 │
//!                        score ▶ rank ▶ cite ◀────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`connector_fs`] | Corpus directory scanner |
//! | [`ingest`] | Corpus loading into the retrieval service |
//! | [`search`] | `fincite search` |
//! | [`get`] | `fincite get` |
//! | [`stats`] | `fincite stats` and `fincite documents` |

pub mod config;
pub mod connector_fs;
pub mod get;
pub mod ingest;
pub mod search;
pub mod stats;
