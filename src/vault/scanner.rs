//! Vault traversal: discovers the note files that actually exist on disk.

use crate::vault::layout::{ASSETS_DIR, BUILD_DIR, EXCLUDED_DIRS, EXCLUDED_FILES};
use ignore::{DirEntry, WalkBuilder};
use std::path::{Path, PathBuf};

/// Directories pruned when looking a single note up by name.
const LOOKUP_EXCLUDED_DIRS: &[&str] = &[ASSETS_DIR, BUILD_DIR];

/// A Markdown note found under the vault root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    /// Absolute path to the file.
    pub absolute_path: PathBuf,
    /// Bare file name, used for consistency checks.
    pub file_name: String,
    /// Path relative to the vault root.
    pub relative_path: PathBuf,
}

/// Recursively discovers note files, pruning reserved directories.
///
/// Walk order carries no meaning; the index file decides output order.
pub struct VaultScanner {
    root: PathBuf,
}

impl VaultScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every note of the vault that is not reserved.
    pub fn scan(&self) -> Vec<NoteFile> {
        let notes: Vec<NoteFile> = self
            .walk(EXCLUDED_DIRS)
            .into_iter()
            .filter_map(|path| self.note_file(path))
            .collect();

        tracing::debug!(root = %self.root.display(), count = notes.len(), "scanned vault");
        notes
    }

    /// Notes of a macro-topic, i.e. named `main.<argument>.*.md`.
    pub fn scan_argument(&self, argument: &str) -> Vec<NoteFile> {
        let prefix = format!("main.{argument}.");
        self.scan()
            .into_iter()
            .filter(|note| {
                note.file_name
                    .strip_prefix(&prefix)
                    .is_some_and(|rest| rest.ends_with(".md"))
            })
            .collect()
    }

    /// Find a note by file name anywhere in the vault.
    ///
    /// Only `assets` and `build` are pruned here, so drafts in the scratch
    /// folder can be converted one at a time.
    pub fn find_note(&self, name: &str) -> Option<PathBuf> {
        if !name.ends_with(".md") {
            return None;
        }
        self.walk(LOOKUP_EXCLUDED_DIRS)
            .into_iter()
            .find(|path| path.file_name().is_some_and(|file| file == name))
    }

    fn note_file(&self, path: PathBuf) -> Option<NoteFile> {
        let file_name = path.file_name()?.to_str()?.to_string();
        if !file_name.ends_with(".md") || EXCLUDED_FILES.contains(&file_name.as_str()) {
            return None;
        }
        let relative_path = path.strip_prefix(&self.root).ok()?.to_path_buf();

        Some(NoteFile {
            absolute_path: path,
            file_name,
            relative_path,
        })
    }

    /// Walk the tree and return regular files, never entering `excluded` dirs.
    fn walk(&self, excluded: &'static [&'static str]) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| !is_excluded_dir(entry, excluded))
            .build();

        let mut files = Vec::new();
        for result in walker {
            match result {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|kind| kind.is_file()) {
                        files.push(entry.into_path());
                    }
                }
                Err(error) => {
                    tracing::warn!(root = %self.root.display(), %error, "failed to read vault entry");
                }
            }
        }
        files
    }
}

fn is_excluded_dir(entry: &DirEntry, excluded: &[&str]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_some_and(|kind| kind.is_dir())
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excluded.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "content").unwrap();
    }

    fn sample_vault() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "main.md");
        touch(root, "custom.md");
        touch(root, "algebra/main.algebra.groups.md");
        touch(root, "algebra/deep/main.algebra.rings.md");
        touch(root, "algebra/notes.txt");
        touch(root, "geometry/main.geometry.lines.md");
        touch(root, "assets/readme.md");
        touch(root, "build/combined_notes.md");
        touch(root, "build/old.md");
        touch(root, "config/config-files/default-note.md");
        touch(root, "rusco/main.rusco.draft.md");
        dir
    }

    #[test]
    fn test_scan_skips_reserved_entries() {
        let dir = sample_vault();
        let scanner = VaultScanner::new(dir.path());

        let mut names: Vec<String> = scanner.scan().into_iter().map(|n| n.file_name).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "main.algebra.groups.md",
                "main.algebra.rings.md",
                "main.geometry.lines.md",
            ]
        );
    }

    #[test]
    fn test_scan_never_enters_excluded_dirs() {
        let dir = sample_vault();
        let scanner = VaultScanner::new(dir.path());

        for note in scanner.scan() {
            for component in note.relative_path.components() {
                let name = component.as_os_str().to_str().unwrap();
                assert!(!EXCLUDED_DIRS.contains(&name), "{:?}", note.relative_path);
            }
            assert!(note.absolute_path.starts_with(dir.path()));
        }
    }

    #[test]
    fn test_scan_argument_matches_file_pattern() {
        let dir = sample_vault();
        touch(dir.path(), "algebra/intro.md");
        let scanner = VaultScanner::new(dir.path());

        let mut names: Vec<String> = scanner
            .scan_argument("algebra")
            .into_iter()
            .map(|n| n.file_name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["main.algebra.groups.md", "main.algebra.rings.md"]);
    }

    #[test]
    fn test_find_note() {
        let dir = sample_vault();
        let scanner = VaultScanner::new(dir.path());

        let found = scanner.find_note("main.algebra.rings.md").unwrap();
        assert!(found.ends_with("algebra/deep/main.algebra.rings.md"));
        assert!(scanner.find_note("main.rusco.draft.md").is_some());
        assert!(scanner.find_note("old.md").is_none());
        assert!(scanner.find_note("missing.md").is_none());
    }
}
