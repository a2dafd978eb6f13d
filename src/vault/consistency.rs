//! Consistency gate between the index and the vault tree.
//!
//! Every note on disk must be referenced by the index. Notes are compared by
//! file name only, so two notes with the same name in different folders
//! count as the same note.

use crate::error::{Result, VaultError};
use crate::vault::layout::SCRATCH_DIR;
use crate::vault::scanner::NoteFile;
use std::collections::BTreeSet;
use std::path::{Component, Path};

/// File names present on disk but missing from the references, sorted.
pub fn unindexed_notes(references: &[String], actual: &[NoteFile]) -> Vec<String> {
    let scratch_prefix = format!("main.{SCRATCH_DIR}.");

    let referenced: BTreeSet<&str> = references.iter().map(|r| base_name(r)).collect();

    let on_disk: BTreeSet<&str> = actual
        .iter()
        .filter(|note| !in_scratch_dir(&note.relative_path))
        .filter(|note| !note.file_name.starts_with(&scratch_prefix))
        .map(|note| note.file_name.as_str())
        .collect();

    on_disk
        .difference(&referenced)
        .map(|name| name.to_string())
        .collect()
}

/// Fail when a note on disk is not referenced by the index.
pub fn check_consistency(references: &[String], actual: &[NoteFile]) -> Result<()> {
    tracing::info!("consistency check started");

    let missing = unindexed_notes(references, actual);
    if !missing.is_empty() {
        return Err(VaultError::Unindexed(missing).into());
    }

    tracing::info!(
        references = references.len(),
        notes = actual.len(),
        "consistency check passed"
    );
    Ok(())
}

fn base_name(reference: &str) -> &str {
    reference
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(reference)
}

fn in_scratch_dir(relative: &Path) -> bool {
    relative
        .components()
        .any(|component| matches!(component, Component::Normal(name) if name == SCRATCH_DIR))
}
