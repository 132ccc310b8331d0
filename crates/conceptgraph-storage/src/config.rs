//! Paths and tuning knobs shared by the build and the merge tooling.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for building and editing the graph.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Root of the `<subject>/*.json` fragment tree.
    pub input_dir: PathBuf,
    /// Where the merged graph document is written.
    pub output_graph: PathBuf,
    /// Append-only merge audit log.
    pub merge_log: PathBuf,
    /// Where `index` writes the subject index.
    pub subject_index: PathBuf,
    /// File names never treated as input (case-insensitive).
    pub skip_files: Vec<String>,
    /// Maximum number of merge suggestions.
    pub suggestion_limit: usize,
    /// Minimum similarity for a merge suggestion.
    pub suggestion_threshold: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("json_nodes"),
            output_graph: PathBuf::from("data/graphs/merged_graph.json"),
            merge_log: PathBuf::from("data/graphs/merge_log.txt"),
            subject_index: PathBuf::from("data/indexes/subject_index.json"),
            skip_files: vec![
                "flashcards.json".to_string(),
                "merged_graph.json".to_string(),
                "subject_index.json".to_string(),
            ],
            suggestion_limit: conceptgraph_core::suggest::DEFAULT_SUGGESTION_LIMIT,
            suggestion_threshold: conceptgraph_core::suggest::DEFAULT_SUGGESTION_THRESHOLD,
        }
    }
}

impl GraphConfig {
    /// Read a JSON config file; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config `{}`", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config `{}`", path.display()))
    }

    /// `load(path)` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn suggest_options(&self) -> conceptgraph_core::SuggestOptions {
        conceptgraph_core::SuggestOptions {
            limit: self.suggestion_limit,
            threshold: self.suggestion_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conceptgraph.json");
        std::fs::write(&path, r#"{"input_dir": "fragments", "suggestion_limit": 3}"#).unwrap();

        let config = GraphConfig::load(&path).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("fragments"));
        assert_eq!(config.suggestion_limit, 3);
        assert_eq!(config.output_graph, GraphConfig::default().output_graph);
        assert_eq!(config.skip_files.len(), 3);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(GraphConfig::load(&dir.path().join("nope.json")).is_err());
        assert_eq!(
            GraphConfig::load_or_default(None).unwrap(),
            GraphConfig::default()
        );
    }
}
