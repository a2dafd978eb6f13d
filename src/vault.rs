//! Vault discovery, consistency checking and note combination.
//!
//! The index file (`main.md` or `custom.md`) is the single source of truth
//! for which notes are converted and in which order. The scanner only tells
//! what exists on disk; the consistency check makes sure the two agree.

pub mod combiner;
pub mod consistency;
pub mod layout;
pub mod scanner;

use crate::error::{Error, Result, VaultError};
use crate::markdown::links::{scan_links, scan_links_for_argument};
use std::path::Path;

pub use combiner::{CombinedDocument, NoteCombiner, propagate_yaml, strip_header, write_combined};
pub use consistency::{check_consistency, unindexed_notes};
pub use layout::{IndexKind, Project, ProjectKind};
pub use scanner::{NoteFile, VaultScanner};

/// Read an index file, failing when it does not exist.
pub fn read_index(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            Err(VaultError::IndexMissing(path.to_path_buf()).into())
        }
        Err(error) => Err(Error::io(path, error)),
    }
}

/// Every note reference of an index, in document order.
pub fn index_references(path: &Path) -> Result<Vec<String>> {
    let content = read_index(path)?;
    let references = scan_links(content.lines());
    if references.is_empty() {
        return Err(VaultError::EmptyIndex(display_name(path)).into());
    }
    tracing::debug!(index = %path.display(), count = references.len(), "read index");
    Ok(references)
}

/// The references of an index that belong to one macro-topic.
pub fn group_references(path: &Path, argument: &str) -> Result<Vec<String>> {
    let content = read_index(path)?;
    let references = scan_links_for_argument(content.lines(), argument);
    if references.is_empty() {
        return Err(VaultError::EmptyGroup(argument.to_string()).into());
    }
    Ok(references)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_index_references() {
        let dir = tempdir().unwrap();
        let index = dir.path().join("main.md");
        fs::write(&index, "# X\n- [A](x/a.md)\n- [B](x/b.md)\n").unwrap();
        assert_eq!(index_references(&index).unwrap(), vec!["x/a.md", "x/b.md"]);
    }

    #[test]
    fn test_empty_index_is_fatal() {
        let dir = tempdir().unwrap();
        let index = dir.path().join("main.md");
        fs::write(&index, "# Nothing linked yet\n").unwrap();
        let err = index_references(&index).unwrap_err();
        assert!(matches!(err, Error::Vault(VaultError::EmptyIndex(name)) if name == "main.md"));
    }

    #[test]
    fn test_missing_index_is_fatal() {
        let dir = tempdir().unwrap();
        let err = index_references(&dir.path().join("custom.md")).unwrap_err();
        assert!(matches!(err, Error::Vault(VaultError::IndexMissing(_))));
    }

    #[test]
    fn test_group_without_matches_is_fatal() {
        let dir = tempdir().unwrap();
        let index = dir.path().join("main.md");
        fs::write(&index, "- [A](x/a.md)\n").unwrap();
        assert!(group_references(&index, "y").is_err());
        assert_eq!(group_references(&index, "x").unwrap(), vec!["x/a.md"]);
    }
}
