//! Merging collaborators' `assets/` folders into one tree.

use crate::bank::registry::Collaborator;
use crate::error::{Error, Result};
use crate::vault::layout::ASSETS_DIR;
use ignore::WalkBuilder;
use std::fs;
use std::path::Path;

/// Copy every file below `src` into `dest`, keeping relative paths.
///
/// Existing folders are merged, existing files with the same relative path
/// are overwritten.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;
    let walker = WalkBuilder::new(src).standard_filters(false).build();

    for result in walker {
        let entry = result.map_err(|e| Error::Other(e.into()))?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_some_and(|kind| kind.is_dir()) {
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| Error::io(entry.path(), e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Merge the `assets/` folder of each collaborator into `dest`.
///
/// Collaborators without assets are reported and skipped. When two
/// collaborators ship the same file the later one in `collaborators` wins.
pub fn merge_assets(collaborators: &[Collaborator], dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;

    for collaborator in collaborators {
        let assets = collaborator.vault_dir().join(ASSETS_DIR);
        if !assets.is_dir() {
            tracing::warn!(
                collaborator = %collaborator.name,
                path = %assets.display(),
                "assets not found"
            );
            continue;
        }
        let copied = copy_tree(&assets, dest)?;
        tracing::info!(collaborator = %collaborator.name, files = copied, "assets copied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn collaborator(root: &Path, name: &str) -> Collaborator {
        Collaborator {
            name: name.to_string(),
            index_path: root.join(name).join("vault/main.md"),
        }
    }

    #[test]
    fn test_merge_assets_unions_topic_folders() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let alice = root.join("alice/vault/assets/algebra/imgs");
        let bob = root.join("bob/vault/assets/algebra/pdfs");
        fs::create_dir_all(&alice).unwrap();
        fs::create_dir_all(&bob).unwrap();
        fs::write(alice.join("a.png"), "a").unwrap();
        fs::write(bob.join("b.pdf"), "b").unwrap();

        let dest = root.join("staging/assets");
        let team = [
            collaborator(root, "alice"),
            collaborator(root, "bob"),
            collaborator(root, "carol"),
        ];
        merge_assets(&team, &dest).unwrap();

        assert!(dest.join("algebra/imgs/a.png").is_file());
        assert!(dest.join("algebra/pdfs/b.pdf").is_file());
    }

    #[test]
    fn test_copy_tree_overwrites() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("x.txt"), "new").unwrap();
        fs::write(dest.join("x.txt"), "old").unwrap();

        assert_eq!(copy_tree(&src, &dest).unwrap(), 1);
        assert_eq!(fs::read_to_string(dest.join("x.txt")).unwrap(), "new");
    }
}
