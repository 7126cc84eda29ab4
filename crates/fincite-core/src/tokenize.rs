//! Text normalization shared by ingestion, taxonomy compilation and queries.
//!
//! Normalization lowercases, splits on non-alphanumeric boundaries and drops
//! stopwords. Whole words listed in the compound allow-list (after trimming
//! surrounding punctuation) survive as a single token, so `50/30/20` is not
//! shredded into three numbers.
//!
//! ```rust
//! use fincite_core::tokenize::Tokenizer;
//!
//! let tokenizer = Tokenizer::default();
//! let text = tokenizer.normalize("Try the 50/30/20 rule, then track spending.");
//! assert!(text.contains("50/30/20"));
//! assert!(text.contains("spending"));
//! assert!(!text.contains("the"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Tokenizer settings, usually read from the `[tokenizer]` config section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Words kept intact even though they contain separators.
    pub compound_tokens: Vec<String>,
    /// Words removed from every token stream.
    pub stopwords: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            compound_tokens: ["50/30/20", "w-2", "s&p"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from",
    "how", "i", "if", "in", "is", "it", "its", "me", "my", "of", "on", "or", "should", "that",
    "the", "this", "to", "was", "what", "when", "where", "which", "who", "why", "will", "with",
    "you", "your",
];

/// Normalized view of a piece of text.
///
/// `terms` keeps source order (needed for multi-word keyword matching);
/// `set` collapses duplicates and is what scoring compares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedText {
    terms: Vec<String>,
    set: BTreeSet<String>,
}

impl TokenizedText {
    fn from_terms(terms: Vec<String>) -> Self {
        let set = terms.iter().cloned().collect();
        Self { terms, set }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.set.contains(token)
    }

    /// True if `sequence` occurs as contiguous terms. A one-element
    /// sequence is a plain set lookup.
    pub fn contains_sequence(&self, sequence: &[String]) -> bool {
        match sequence {
            [] => false,
            [single] => self.contains(single),
            _ => self
                .terms
                .windows(sequence.len())
                .any(|window| window == sequence),
        }
    }

    /// Number of distinct tokens present in both texts.
    pub fn overlap(&self, other: &TokenizedText) -> usize {
        self.set.intersection(&other.set).count()
    }

    /// Distinct tokens present in both texts, in sorted order.
    pub fn shared<'a>(&'a self, other: &'a TokenizedText) -> impl Iterator<Item = &'a str> + 'a {
        self.set.intersection(&other.set).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.set.iter().map(String::as_str)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// Lowercasing, stemming-free tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    compounds: HashSet<String>,
    stopwords: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            compounds: config
                .compound_tokens
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            stopwords: config
                .stopwords
                .iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
        }
    }

    /// Normalize `text` into tokens. Never fails; the result may be empty.
    pub fn normalize(&self, text: &str) -> TokenizedText {
        let mut terms = Vec::new();

        for word in text.split_whitespace() {
            let lowered = word.to_lowercase();
            let trimmed = lowered.trim_matches(|c: char| !c.is_alphanumeric());
            if trimmed.is_empty() {
                continue;
            }

            if self.compounds.contains(trimmed) {
                terms.push(trimmed.to_string());
                continue;
            }

            for piece in trimmed.split(|c: char| !c.is_alphanumeric()) {
                if !piece.is_empty() && !self.stopwords.contains(piece) {
                    terms.push(piece.to_string());
                }
            }
        }

        TokenizedText::from_terms(terms)
    }

    /// Normalize a keyword or phrase into the term sequence used for
    /// contiguous matching.
    pub fn terms_of(&self, phrase: &str) -> Vec<String> {
        self.normalize(phrase).terms
    }
}
