//! Fragment discovery: `<root>/<subject>/*.json`.
//!
//! Subjects are visited in lexicographic order of their directory name and
//! files within a subject in lexicographic order of file name, so a build over
//! unchanged input always folds fragments in the same order.

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Output files that may sit next to the fragments but are never input.
pub const DEFAULT_SKIP_FILES: &[&str] = &["flashcards.json", "merged_graph.json", "subject_index.json"];

/// One fragment file and the subject it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectFile {
    pub subject_id: String,
    pub display_name: String,
    pub path: PathBuf,
}

impl SubjectFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// `graph_theory` -> `Graph Theory`.
///
/// `_` and `-` become spaces; every letter that follows a non-letter is
/// uppercased and every other letter lowercased.
pub fn display_name_from_slug(slug: &str) -> String {
    let mut out = String::with_capacity(slug.len());
    let mut prev_is_letter = false;
    for c in slug.chars() {
        let c = if c == '_' || c == '-' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Lazy, ordered iterator over the fragment files under a root directory.
///
/// Subject directories are listed up front; each subject's files are listed
/// only when the iterator reaches it.
pub struct SubjectFiles {
    subjects: std::vec::IntoIter<PathBuf>,
    current: Option<(String, String, std::vec::IntoIter<PathBuf>)>,
    skip: HashSet<String>,
}

impl SubjectFiles {
    fn list_subject(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(dir = %dir.display(), "failed listing subject folder: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let lowered = entry.file_name().to_string_lossy().to_lowercase();
            if self.skip.contains(&lowered) {
                tracing::debug!(path = %path.display(), "skipping reserved file");
                continue;
            }
            files.push(path.to_path_buf());
        }
        files
    }
}

impl Iterator for SubjectFiles {
    type Item = SubjectFile;

    fn next(&mut self) -> Option<SubjectFile> {
        loop {
            if let Some((subject_id, display_name, files)) = self.current.as_mut() {
                if let Some(path) = files.next() {
                    return Some(SubjectFile {
                        subject_id: subject_id.clone(),
                        display_name: display_name.clone(),
                        path,
                    });
                }
            }
            let dir = self.subjects.next()?;
            let subject_id = dir
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let display_name = display_name_from_slug(&subject_id);
            let files = self.list_subject(&dir);
            self.current = Some((subject_id, display_name, files.into_iter()));
        }
    }
}

/// Enumerate fragment files under `root`, skipping reserved names
/// (case-insensitive).
///
/// Fails only if `root` itself cannot be listed.
pub fn iter_subject_files<S: AsRef<str>>(root: &Path, skip_files: &[S]) -> Result<SubjectFiles> {
    if !root.is_dir() {
        return Err(anyhow!("fragment folder not found: {}", root.display()));
    }

    let mut subjects = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        // A dangling subject symlink is skipped, not fatal.
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.io_error().is_some() && err.depth() == 1 => {
                tracing::warn!(root = %root.display(), "skipping unreadable subject entry: {err}");
                continue;
            }
            Err(err) => return Err(anyhow!("failed listing {}: {err}", root.display())),
        };
        if entry.file_type().is_dir() {
            subjects.push(entry.into_path());
        }
    }

    Ok(SubjectFiles {
        subjects: subjects.into_iter(),
        current: None,
        skip: skip_files
            .iter()
            .map(|s| s.as_ref().to_lowercase())
            .collect(),
    })
}

/// What reading one fragment file produced.
#[derive(Debug)]
pub enum LoadOutcome {
    Parsed(Value),
    /// Zero-byte file.
    Empty,
    Malformed(serde_json::Error),
    Unreadable(std::io::Error),
}

pub fn load_fragment(path: &Path) -> LoadOutcome {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => return LoadOutcome::Unreadable(err),
    };
    if bytes.is_empty() {
        return LoadOutcome::Empty;
    }
    match serde_json::from_slice(&bytes) {
        Ok(value) => LoadOutcome::Parsed(value),
        Err(err) => LoadOutcome::Malformed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn display_names_are_title_cased() {
        assert_eq!(display_name_from_slug("graph_theory"), "Graph Theory");
        assert_eq!(display_name_from_slug("machine-learning_101"), "Machine Learning 101");
        assert_eq!(display_name_from_slug("DATA_structures"), "Data Structures");
    }

    #[test]
    fn files_are_ordered_and_reserved_names_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("zoology")).unwrap();
        fs::create_dir_all(root.join("algorithms")).unwrap();
        fs::write(root.join("algorithms/sort.json"), "{}").unwrap();
        fs::write(root.join("algorithms/heap.json"), "{}").unwrap();
        fs::write(root.join("algorithms/Merged_Graph.json"), "{}").unwrap();
        fs::write(root.join("algorithms/notes.txt"), "x").unwrap();
        fs::write(root.join("zoology/cat.json"), "{}").unwrap();
        fs::write(root.join("stray.json"), "{}").unwrap();

        let files: Vec<(String, String)> = iter_subject_files(root, DEFAULT_SKIP_FILES)
            .unwrap()
            .map(|f| (f.subject_id.clone(), f.file_name()))
            .collect();

        assert_eq!(
            files,
            vec![
                ("algorithms".to_string(), "heap.json".to_string()),
                ("algorithms".to_string(), "sort.json".to_string()),
                ("zoology".to_string(), "cat.json".to_string()),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_subject_folder_is_followed() {
        let dir = tempdir().unwrap();
        let shared = dir.path().join("shared/graphs");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("dijkstra.json"), "{}").unwrap();

        let root = dir.path().join("json_nodes");
        fs::create_dir_all(root.join("algorithms")).unwrap();
        fs::write(root.join("algorithms/sort.json"), "{}").unwrap();
        std::os::unix::fs::symlink(&shared, root.join("graph_theory")).unwrap();

        let files: Vec<(String, String)> = iter_subject_files(&root, DEFAULT_SKIP_FILES)
            .unwrap()
            .map(|f| (f.subject_id.clone(), f.file_name()))
            .collect();

        assert_eq!(
            files,
            vec![
                ("algorithms".to_string(), "sort.json".to_string()),
                ("graph_theory".to_string(), "dijkstra.json".to_string()),
            ]
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(iter_subject_files(&dir.path().join("nope"), DEFAULT_SKIP_FILES).is_err());
    }

    #[test]
    fn load_outcomes() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.json");
        let bad = dir.path().join("bad.json");
        let good = dir.path().join("good.json");
        fs::write(&empty, "").unwrap();
        fs::write(&bad, "{not json").unwrap();
        fs::write(&good, r#"{"entity": "Heap"}"#).unwrap();

        assert!(matches!(load_fragment(&empty), LoadOutcome::Empty));
        assert!(matches!(load_fragment(&bad), LoadOutcome::Malformed(_)));
        assert!(matches!(load_fragment(&good), LoadOutcome::Parsed(_)));
        assert!(matches!(
            load_fragment(&dir.path().join("missing.json")),
            LoadOutcome::Unreadable(_)
        ));
    }
}
