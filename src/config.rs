//! TOML configuration.
//!
//! Every section is optional; a missing file section falls back to the
//! built-in defaults, so an empty file is a valid configuration. See
//! `config/fincite.example.toml` for every key.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fincite_core::chunk::PageSplitter;
use fincite_core::citation::CitationConfig;
use fincite_core::rank::{DEFAULT_FLOOR, DEFAULT_LIMIT, DEFAULT_MAX_RELEVANCE};
use fincite_core::score::DEFAULT_TERM_WEIGHT;
use fincite_core::search::{EngineSettings, SearchOptions};
use fincite_core::taxonomy::{default_profiles, Category, Taxonomy};
use fincite_core::tokenize::{Tokenizer, TokenizerConfig};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub retrieval: RetrievalConfig,
    pub citations: CitationConfig,
    pub tokenizer: TokenizerConfig,
    /// Per-category overrides, keyed by category name (`budgeting`, ...).
    pub taxonomy: BTreeMap<String, TaxonomyOverride>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorpusConfig {
    pub root: PathBuf,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub follow_symlinks: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            include_globs: vec!["**/*.txt".to_string(), "**/*.md".to_string()],
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub final_limit: usize,
    pub relevance_floor: f64,
    pub max_relevance: f64,
    pub term_weight: f64,
    pub allow_multiple_chunks_per_document: bool,
    /// Page-marker regex; unset uses `--- Page N ---` lines.
    pub page_marker: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            final_limit: DEFAULT_LIMIT,
            relevance_floor: DEFAULT_FLOOR,
            max_relevance: DEFAULT_MAX_RELEVANCE,
            term_weight: DEFAULT_TERM_WEIGHT,
            allow_multiple_chunks_per_document: false,
            page_marker: None,
        }
    }
}

/// Partial override of one built-in category profile.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaxonomyOverride {
    pub keywords: Option<Vec<String>>,
    pub weight: Option<f64>,
    pub phrases: Option<Vec<String>>,
    pub phrase_bonus: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Defaults with the corpus rooted at `root`. Used when no config file
    /// is given.
    pub fn minimal(root: PathBuf) -> Self {
        let mut config = Self::default();
        config.corpus.root = root;
        config
    }

    /// Engine settings with taxonomy overrides merged over the defaults.
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let mut taxonomy = default_profiles();
        for (name, patch) in &self.taxonomy {
            let category: Category = name.parse()?;
            let Some(profile) = taxonomy.get_mut(&category) else {
                continue;
            };
            if let Some(keywords) = &patch.keywords {
                profile.keywords = keywords.clone();
            }
            if let Some(weight) = patch.weight {
                profile.weight = weight;
            }
            if let Some(phrases) = &patch.phrases {
                profile.phrases = phrases.clone();
            }
            if let Some(bonus) = patch.phrase_bonus {
                profile.phrase_bonus = bonus;
            }
        }

        Ok(EngineSettings {
            tokenizer: self.tokenizer.clone(),
            taxonomy,
            term_weight: self.retrieval.term_weight,
            max_relevance: self.retrieval.max_relevance,
            citations: self.citations.clone(),
            page_marker: self.retrieval.page_marker.clone(),
        })
    }

    /// Search options from `[retrieval]`, before CLI overrides.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            limit: self.retrieval.final_limit,
            floor: self.retrieval.relevance_floor,
            allow_multiple_chunks_per_document: self.retrieval.allow_multiple_chunks_per_document,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.final_limit < 1 {
            bail!("retrieval.final_limit must be >= 1");
        }
        if !r.relevance_floor.is_finite() || r.relevance_floor < 0.0 {
            bail!("retrieval.relevance_floor must be a finite number >= 0");
        }
        if !(r.max_relevance > 0.0 && r.max_relevance <= 1.0) {
            bail!("retrieval.max_relevance must be in (0.0, 1.0]");
        }
        if !r.term_weight.is_finite() || r.term_weight < 0.0 {
            bail!("retrieval.term_weight must be a finite number >= 0");
        }
        if let Some(pattern) = &r.page_marker {
            PageSplitter::new(pattern)?;
        }
        self.citations.validate()?;

        let settings = self.engine_settings()?;
        Taxonomy::new(&settings.taxonomy, &Tokenizer::new(&settings.tokenizer))?;

        if self.corpus.include_globs.is_empty() {
            bail!("corpus.include_globs must not be empty");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}
