//! Topic taxonomy: categories, representative keywords and scoring weights.
//!
//! A [`Taxonomy`] is built once from a table of [`CategoryProfile`]s and is
//! immutable afterwards. Ingestion uses it to tag chunks; the scorer uses it
//! to weigh category overlap and phrase bonuses. Tests can build synthetic
//! taxonomies from any subset of categories.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::tokenize::{TokenizedText, Tokenizer};

/// Financial topic a chunk can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EmergencyFund,
    Budgeting,
    Investing,
    Debt,
    Insurance,
    Retirement,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::EmergencyFund,
        Category::Budgeting,
        Category::Investing,
        Category::Debt,
        Category::Insurance,
        Category::Retirement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EmergencyFund => "emergency_fund",
            Category::Budgeting => "budgeting",
            Category::Investing => "investing",
            Category::Debt => "debt",
            Category::Insurance => "insurance",
            Category::Retirement => "retirement",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "unknown category '{}'. Must be one of: {}",
                    s,
                    Category::ALL.map(|c| c.as_str()).join(", ")
                ))
            })
    }
}

/// Configuration for one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryProfile {
    /// Representative keywords. Multi-word entries match as contiguous terms.
    pub keywords: Vec<String>,
    /// Added once per keyword shared by the query and a tagged chunk.
    pub weight: f64,
    /// Core subject phrases looked up in the chunk's lowercased raw text.
    #[serde(default)]
    pub phrases: Vec<String>,
    /// Flat bonus when any phrase is present.
    #[serde(default)]
    pub phrase_bonus: f64,
}

impl CategoryProfile {
    fn new(keywords: &[&str], weight: f64, phrases: &[&str], phrase_bonus: f64) -> Self {
        Self {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            weight,
            phrases: phrases.iter().map(|s| s.to_string()).collect(),
            phrase_bonus,
        }
    }
}

/// The built-in financial taxonomy.
///
/// Weights are hand-tuned starting points, not derived values; override
/// them through `[taxonomy.<category>]` in the config file.
pub fn default_profiles() -> BTreeMap<Category, CategoryProfile> {
    BTreeMap::from([
        (
            Category::EmergencyFund,
            CategoryProfile::new(
                &[
                    "emergency", "fund", "savings", "security", "crisis", "unexpected",
                    "job loss", "medical", "repairs", "high-yield", "reserve",
                ],
                0.15,
                &["emergency", "fund"],
                0.30,
            ),
        ),
        (
            Category::Budgeting,
            CategoryProfile::new(
                &[
                    "budget", "budgeting", "spending", "income", "expense", "expenses",
                    "50/30/20", "allocation", "needs", "wants", "track",
                ],
                0.12,
                &["budget", "50/30/20"],
                0.25,
            ),
        ),
        (
            Category::Investing,
            CategoryProfile::new(
                &[
                    "investment", "investing", "portfolio", "diversification", "risk",
                    "market", "index", "funds", "stocks", "bonds",
                ],
                0.10,
                &["investment", "diversification"],
                0.20,
            ),
        ),
        (
            Category::Debt,
            CategoryProfile::new(
                &[
                    "debt", "loan", "loans", "credit", "payoff", "interest", "mortgage",
                    "high-interest",
                ],
                0.10,
                &["debt", "credit"],
                0.20,
            ),
        ),
        (
            Category::Insurance,
            CategoryProfile::new(
                &["insurance", "coverage", "premium", "deductible", "policy", "disability"],
                0.10,
                &["insurance"],
                0.20,
            ),
        ),
        (
            Category::Retirement,
            CategoryProfile::new(
                &["retirement", "401k", "ira", "pension", "roth"],
                0.10,
                &["retirement"],
                0.20,
            ),
        ),
    ])
}

/// A keyword normalized with the engine's tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub text: String,
    terms: Vec<String>,
}

impl Keyword {
    pub fn is_in(&self, text: &TokenizedText) -> bool {
        text.contains_sequence(&self.terms)
    }
}

/// A category ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledCategory {
    pub category: Category,
    pub weight: f64,
    pub phrase_bonus: f64,
    keywords: Vec<Keyword>,
    phrases: Vec<String>,
}

impl CompiledCategory {
    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// Keywords of this category present in `text`.
    pub fn keywords_in<'a>(&'a self, text: &'a TokenizedText) -> impl Iterator<Item = &'a Keyword> + 'a {
        self.keywords.iter().filter(move |k| k.is_in(text))
    }

    /// First core phrase found in `folded_text` (already lowercased).
    pub fn phrase_in(&self, folded_text: &str) -> Option<&str> {
        self.phrases
            .iter()
            .find(|p| folded_text.contains(p.as_str()))
            .map(String::as_str)
    }
}

/// Immutable category table used for tagging and scoring.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<CompiledCategory>,
}

impl Taxonomy {
    /// Validate and compile a profile table.
    pub fn new(profiles: &BTreeMap<Category, CategoryProfile>, tokenizer: &Tokenizer) -> Result<Self> {
        for (category, profile) in profiles {
            if !profile.weight.is_finite() || profile.weight < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "taxonomy.{category}.weight must be a finite number >= 0"
                )));
            }
            if !profile.phrase_bonus.is_finite() || profile.phrase_bonus < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "taxonomy.{category}.phrase_bonus must be a finite number >= 0"
                )));
            }
            if profile.keywords.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "taxonomy.{category}.keywords must not be empty"
                )));
            }
            if let Some(bad) = profile
                .keywords
                .iter()
                .find(|k| tokenizer.terms_of(k).is_empty())
            {
                return Err(Error::InvalidConfig(format!(
                    "taxonomy.{category}: keyword {bad:?} has no searchable terms"
                )));
            }
        }
        Ok(Self::compile(profiles, tokenizer))
    }

    /// The built-in financial taxonomy.
    pub fn financial(tokenizer: &Tokenizer) -> Self {
        Self::compile(&default_profiles(), tokenizer)
    }

    fn compile(profiles: &BTreeMap<Category, CategoryProfile>, tokenizer: &Tokenizer) -> Self {
        let categories = profiles
            .iter()
            .map(|(category, profile)| {
                let mut keywords: Vec<Keyword> = Vec::new();
                for text in &profile.keywords {
                    let terms = tokenizer.terms_of(text);
                    if terms.is_empty() || keywords.iter().any(|k| k.terms == terms) {
                        continue;
                    }
                    keywords.push(Keyword {
                        text: text.trim().to_lowercase(),
                        terms,
                    });
                }
                CompiledCategory {
                    category: *category,
                    weight: profile.weight,
                    phrase_bonus: profile.phrase_bonus,
                    keywords,
                    phrases: profile
                        .phrases
                        .iter()
                        .map(|p| p.trim().to_lowercase())
                        .filter(|p| !p.is_empty())
                        .collect(),
                }
            })
            .collect();
        Self { categories }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledCategory> {
        self.categories.iter()
    }

    pub fn get(&self, category: Category) -> Option<&CompiledCategory> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories with at least one representative keyword in `text`.
    pub fn tags_for(&self, text: &TokenizedText) -> BTreeSet<Category> {
        self.categories
            .iter()
            .filter(|c| c.keywords_in(text).next().is_some())
            .map(|c| c.category)
            .collect()
    }
}
