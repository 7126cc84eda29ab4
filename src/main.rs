//! # fincite CLI
//!
//! Scans a corpus directory, ingests every matching file and runs one
//! command against the resulting in-memory index.
//!
//! ## Usage
//!
//! ```bash
//! fincite [--config ./config/fincite.toml] [--corpus ./docs] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fincite search "<query>"` | Ranked citations for a query |
//! | `fincite get <id>` | One document with its pages and topic tags |
//! | `fincite documents` | Every ingested document |
//! | `fincite stats` | Document, page and per-topic counts |
//!
//! ## Examples
//!
//! ```bash
//! # Top three citations
//! fincite --corpus ./docs search "how big should an emergency fund be"
//!
//! # Several pages per document, with a score breakdown, as JSON
//! fincite --corpus ./docs search "budget" --multi --explain --json
//!
//! # Only documents under guides/
//! fincite --corpus ./docs search "index funds" --source guides/
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fincite::config::{self, Config};
use fincite::search::SearchArgs;
use fincite::{get, ingest, search, stats};

/// Lexical relevance search with page-level citations over financial
/// documents.
#[derive(Parser)]
#[command(
    name = "fincite",
    about = "Rank financial documents against a question and cite the best pages",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Without it, built-in defaults are
    /// used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Corpus directory. Overrides `[corpus].root`.
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the corpus and print ranked citations.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of citations.
        #[arg(long)]
        limit: Option<usize>,

        /// Only keep matches scoring strictly above this.
        #[arg(long)]
        floor: Option<f64>,

        /// Allow several pages from the same document.
        #[arg(long)]
        multi: bool,

        /// Restrict to a document id, a title or a directory prefix.
        #[arg(long)]
        source: Option<String>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Include a per-signal score breakdown.
        #[arg(long)]
        explain: bool,
    },

    /// Show one document by id (its path relative to the corpus root).
    Get {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// List ingested documents.
    Documents {
        #[arg(long)]
        json: bool,
    },

    /// Corpus counts by topic.
    Stats {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::minimal(PathBuf::from(".")),
    };
    if let Some(root) = cli.corpus {
        cfg.corpus.root = root;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let (service, report) = ingest::load_corpus(&cfg)?;

    match cli.command {
        Commands::Search {
            query,
            limit,
            floor,
            multi,
            source,
            json,
            explain,
        } => {
            let args = SearchArgs {
                limit,
                floor,
                multi,
                source,
                json,
                explain,
            };
            search::run_search(&cfg, &service, &query, &args)?;
        }
        Commands::Get { id, json } => {
            get::run_get(&service, &id, json)?;
        }
        Commands::Documents { json } => {
            stats::run_documents(&service, json)?;
        }
        Commands::Stats { json } => {
            stats::run_stats(&cfg, &service, &report, json)?;
        }
    }

    Ok(())
}
