//! Loads the corpus directory into a [`RetrievalService`].
//!
//! Files that yield no text are skipped with a warning; any other engine
//! error aborts the load.

use anyhow::{Context, Result};
use tracing::{info, warn};

use fincite_core::models::IngestOutcome;
use fincite_core::search::RetrievalService;
use fincite_core::Error;

use crate::config::Config;
use crate::connector_fs::{scan_corpus, SourceFile};

/// Counts from one corpus load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Build a service from `config` and ingest every corpus file.
pub fn load_corpus(config: &Config) -> Result<(RetrievalService, IngestReport)> {
    let settings = config.engine_settings()?;
    let service = RetrievalService::new(&settings).context("Failed to build retrieval engine")?;
    let files = scan_corpus(&config.corpus)?;
    let report = ingest_files(&service, &files)?;
    info!(
        documents = report.inserted + report.replaced + report.unchanged,
        skipped = report.skipped,
        "corpus loaded"
    );
    Ok((service, report))
}

pub fn ingest_files(service: &RetrievalService, files: &[SourceFile]) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    for file in files {
        match service.ingest_document(&file.id, &file.title, &file.body) {
            Ok(IngestOutcome::Inserted) => report.inserted += 1,
            Ok(IngestOutcome::Replaced) => report.replaced += 1,
            Ok(IngestOutcome::Unchanged) => report.unchanged += 1,
            Err(Error::EmptyDocument { id }) => {
                warn!(id = %id, path = %file.path.display(), "skipping document with no text");
                report.skipped += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to ingest {}", file.path.display()))
            }
        }
    }
    Ok(report)
}
