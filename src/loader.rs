//! Canonical source loader.
//!
//! Reads every `*.json` file in the configured class directory, paired
//! with its origin path for error reporting. Filename-sorted for
//! reproducible ordering across runs.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::IngestError;

/// One loaded source document and where it came from.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub document: Value,
}

impl SourceFile {
    /// File stem used in per-file reports (`barbarian.json` → `barbarian`).
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// File name used in validation reports.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Load all class JSON files from `dir` in filename-sorted order.
/// Fails if the directory yields zero documents or any file is not
/// parseable JSON.
pub fn load_class_files(dir: &Path) -> Result<Vec<SourceFile>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(IngestError::EmptyCorpus {
            dir: dir.to_path_buf(),
        }
        .into());
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        files.push(SourceFile { path, document });
    }

    Ok(files)
}
