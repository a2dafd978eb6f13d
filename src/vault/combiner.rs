//! Note combination: header stripping, ordered concatenation and front
//! matter propagation.

use crate::error::{Error, Result};
use crate::markdown::frontmatter::{find_yaml_block, prepend_yaml_block};
use crate::vault::layout::HEADER_SENTINEL;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The merged Markdown handed to the renderer.
#[derive(Debug, Clone, Default)]
pub struct CombinedDocument {
    /// Concatenated note bodies, one blank line after each.
    pub content: String,
    /// Notes that made it into the document, in order.
    pub included: Vec<PathBuf>,
    /// References that could not be found on disk.
    pub skipped: Vec<String>,
}

/// Drop the generated header of a note.
///
/// Everything up to and including the first sentinel line is discarded, and
/// any later sentinel line is dropped as well. Without a sentinel the content
/// is returned untouched.
pub fn strip_header(content: &str) -> String {
    let mut started = false;
    let mut kept = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        if line.contains(HEADER_SENTINEL) {
            started = true;
            continue;
        }
        if started {
            kept.push_str(line);
        }
    }

    if started { kept } else { content.to_string() }
}

/// Concatenates notes in the order the index lists them.
pub struct NoteCombiner {
    root: PathBuf,
}

impl NoteCombiner {
    /// References are resolved against `root`; absolute references are used as is.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Combine the referenced notes, skipping the ones missing on disk.
    pub fn combine<P: AsRef<Path>>(&self, references: &[P]) -> Result<CombinedDocument> {
        let mut document = CombinedDocument::default();

        for reference in references {
            let reference = reference.as_ref();
            let path = self.root.join(reference);

            let raw = match fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    tracing::warn!(note = %reference.display(), "note not found, skipping");
                    document.skipped.push(reference.display().to_string());
                    continue;
                }
                Err(error) => return Err(Error::io(path, error)),
            };

            document.content.push_str(&strip_header(&raw));
            document.content.push('\n');
            document.included.push(path);
        }

        tracing::debug!(
            included = document.included.len(),
            skipped = document.skipped.len(),
            "combined notes"
        );
        Ok(document)
    }
}

/// Prefix `content` with the YAML block found in `source`, if any.
///
/// A block already leading `content` is replaced, so rebuilding never stacks
/// two blocks. Without a block in `source` the content comes back unchanged.
pub fn propagate_yaml(content: &str, source: &str, source_name: &str) -> String {
    match find_yaml_block(source) {
        Some(block) => prepend_yaml_block(block, content),
        None => {
            tracing::info!(source = source_name, "no YAML block found, front matter left as is");
            content.to_string()
        }
    }
}

/// Write the combined document, creating the build directory if needed.
pub fn write_combined(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::io(path, e))?;
    tracing::info!(path = %path.display(), "combined file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::tempdir;

    const NOTE_WITH_HEADER: &str = indoc! {"
        # Header title
        <!-- @import \"[TOC]\" -->
        <!-- /code_chunk_output -->
        Body line
    "};

    #[test]
    fn test_strip_header_keeps_body_only() {
        assert_eq!(strip_header(NOTE_WITH_HEADER), "Body line\n");
    }

    #[test]
    fn test_strip_header_without_sentinel_is_identity() {
        let content = "# Title\n\nJust text\n";
        let once = strip_header(content);
        assert_eq!(once, content);
        assert_eq!(strip_header(&once), content);
    }

    #[test]
    fn test_strip_header_drops_repeated_sentinels() {
        let content = "head\n<!-- /code_chunk_output -->\nA\n<!-- /code_chunk_output -->\nB\n";
        assert_eq!(strip_header(content), "A\nB\n");
    }

    #[test]
    fn test_combine_follows_reference_order() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("topicX")).unwrap();
        fs::write(dir.path().join("topicX/a.md"), "Alpha\n").unwrap();
        fs::write(dir.path().join("topicX/b.md"), NOTE_WITH_HEADER).unwrap();

        let combiner = NoteCombiner::new(dir.path());
        let doc = combiner.combine(&["topicX/b.md", "topicX/a.md"]).unwrap();

        assert_eq!(doc.content, "Body line\n\nAlpha\n\n");
        assert_eq!(doc.included.len(), 2);
        assert!(doc.skipped.is_empty());
    }

    #[test]
    fn test_combine_skips_missing_notes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "Alpha").unwrap();

        let combiner = NoteCombiner::new(dir.path());
        let doc = combiner.combine(&["gone.md", "a.md"]).unwrap();

        assert_eq!(doc.content, "Alpha\n");
        assert_eq!(doc.skipped, vec!["gone.md"]);
    }

    #[test]
    fn test_combine_accepts_absolute_references() {
        let dir = tempdir().unwrap();
        let note = dir.path().join("alice/topic/a.md");
        fs::create_dir_all(note.parent().unwrap()).unwrap();
        fs::write(&note, "From Alice\n").unwrap();

        let combiner = NoteCombiner::new("/nonexistent-root");
        let doc = combiner.combine(&[note]).unwrap();
        assert_eq!(doc.content, "From Alice\n\n");
    }

    #[test]
    fn test_propagate_yaml_is_idempotent() {
        let index = "---\ntitle: Notes\n---\n\n- [A](a.md)\n";
        let once = propagate_yaml("Alpha\n\n", index, "main.md");
        let twice = propagate_yaml(&once, index, "main.md");

        assert_eq!(once, "---\ntitle: Notes\n---\n\n\nAlpha\n\n");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_propagate_without_yaml_is_noop() {
        let combined = "Alpha\n\n";
        assert_eq!(propagate_yaml(combined, "- [A](a.md)\n", "main.md"), combined);
    }

    #[test]
    fn test_write_combined_creates_build_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build/combined_notes.md");
        write_combined(&path, "x").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "x");
    }
}
