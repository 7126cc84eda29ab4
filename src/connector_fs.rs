//! Corpus directory scanner.
//!
//! Walks `[corpus].root`, keeps files matching the include globs and not the
//! exclude globs, and reads each as already-extracted text. The document id
//! is the path relative to the root (with `/` separators); the title is the
//! file name.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::CorpusConfig;

/// One file read from the corpus directory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: String,
    pub title: String,
    pub path: PathBuf,
    pub body: String,
}

pub fn scan_corpus(config: &CorpusConfig) -> Result<Vec<SourceFile>> {
    let root = &config.root;
    if !root.is_dir() {
        bail!("Corpus root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative_id(relative);

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match std::fs::read_to_string(path) {
            Ok(body) => files.push(SourceFile {
                title: file_title(path),
                id: rel_str,
                path: path.to_path_buf(),
                body,
            }),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
        }
    }

    files.sort_by(|a, b| a.id.cmp(&b.id));
    debug!(root = %root.display(), files = files.len(), "scanned corpus");
    Ok(files)
}

fn relative_id(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_title(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn corpus(tmp: &TempDir) -> CorpusConfig {
        CorpusConfig {
            root: tmp.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("guides")).unwrap();
        fs::create_dir_all(tmp.path().join("node_modules/pkg")).unwrap();
        fs::write(tmp.path().join("zeta.txt"), "z").unwrap();
        fs::write(tmp.path().join("guides/budget.md"), "b").unwrap();
        fs::write(tmp.path().join("image.png"), "p").unwrap();
        fs::write(tmp.path().join("node_modules/pkg/readme.md"), "n").unwrap();

        let files = scan_corpus(&corpus(&tmp)).unwrap();
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["guides/budget.md", "zeta.txt"]);
        assert_eq!(files[0].title, "budget.md");
        assert_eq!(files[0].body, "b");
    }

    #[test]
    fn test_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("drafts")).unwrap();
        fs::write(tmp.path().join("drafts/wip.txt"), "w").unwrap();
        fs::write(tmp.path().join("final.txt"), "f").unwrap();

        let config = CorpusConfig {
            exclude_globs: vec!["drafts/**".to_string()],
            ..corpus(&tmp)
        };
        let files = scan_corpus(&config).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "final.txt");
    }

    #[test]
    fn test_missing_root() {
        let config = CorpusConfig {
            root: PathBuf::from("/nonexistent/corpus"),
            ..Default::default()
        };
        assert!(scan_corpus(&config).is_err());
    }
}
