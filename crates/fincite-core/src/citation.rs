//! Turns ranked matches into attributable [`Citation`]s.
//!
//! An excerpt is the chunk text cut to at most `excerpt_chars` characters at
//! the last word boundary, with `...` appended when anything was cut. Text
//! that already fits is returned untouched. A single word longer than the
//! bound is cut at a char boundary.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Citation, ScoreExplanation, ScoredMatch};
use crate::rank::{cap_relevance, DEFAULT_MAX_RELEVANCE};

pub const DEFAULT_EXCERPT_CHARS: usize = 240;
pub const ELLIPSIS: &str = "...";

/// Citation formatting settings (`[citations]` in the config file).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CitationConfig {
    pub excerpt_chars: usize,
    /// Also emit `highlighted_excerpt` with matched terms wrapped in markers.
    pub highlight: bool,
    pub highlight_open: String,
    pub highlight_close: String,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            highlight: false,
            highlight_open: "<mark>".to_string(),
            highlight_close: "</mark>".to_string(),
        }
    }
}

impl CitationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.excerpt_chars == 0 {
            return Err(Error::InvalidConfig(
                "citations.excerpt_chars must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds citations with a fixed excerpt bound and relevance cap.
#[derive(Debug, Clone)]
pub struct CitationBuilder {
    config: CitationConfig,
    max_relevance: f64,
}

impl Default for CitationBuilder {
    fn default() -> Self {
        Self {
            config: CitationConfig::default(),
            max_relevance: DEFAULT_MAX_RELEVANCE,
        }
    }
}

impl CitationBuilder {
    pub fn new(config: CitationConfig, max_relevance: f64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            max_relevance,
        })
    }

    pub fn build(&self, scored: &ScoredMatch<'_>, explain: bool) -> Citation {
        let excerpt = excerpt(&scored.chunk.raw_text, self.config.excerpt_chars);
        let matched_terms: Vec<String> = scored.breakdown.matched_terms.iter().cloned().collect();

        let highlighted_excerpt = if self.config.highlight {
            highlight(
                &excerpt,
                &matched_terms,
                &self.config.highlight_open,
                &self.config.highlight_close,
            )
        } else {
            None
        };

        let explain = explain.then(|| ScoreExplanation {
            raw_score: scored.raw_score,
            category_overlap: scored.breakdown.category_overlap,
            exact_phrase: scored.breakdown.exact_phrase,
            term_frequency: scored.breakdown.term_frequency,
            signals: scored.matched_signals.iter().copied().collect(),
        });

        Citation {
            source: scored.document.title.clone(),
            document_id: scored.document.id.clone(),
            page: scored.chunk.page_number,
            excerpt,
            relevance_score: cap_relevance(scored.raw_score, self.max_relevance),
            matched_terms,
            categories: scored.breakdown.categories.iter().copied().collect(),
            highlighted_excerpt,
            explain,
        }
    }
}

/// Cut `text` to at most `max_chars` characters (plus the ellipsis).
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let head = &text[..cut];
    let body = if text[cut..].starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(boundary) if !head[..boundary].trim().is_empty() => &head[..boundary],
            _ => head,
        }
    };
    format!("{}{ELLIPSIS}", body.trim_end())
}

/// Wrap whole-word, case-insensitive occurrences of `terms` in markers.
/// Returns `None` when there is nothing to highlight.
pub fn highlight(text: &str, terms: &[String], open: &str, close: &str) -> Option<String> {
    let mut terms: Vec<&str> = terms
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return None;
    }
    // Longest first so "high-interest" wins over "interest".
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).ok()?;
    if !pattern.is_match(text) {
        return None;
    }
    Some(
        pattern
            .replace_all(text, |caps: &regex::Captures<'_>| {
                format!("{open}{}{close}", &caps[0])
            })
            .into_owned(),
    )
}
