//! Building the bank's combined index and resolving the notes it lists.

use crate::bank::registry::{Collaborator, Registry};
use crate::error::{BankError, Result};
use crate::markdown::links::{absolutize_links, normalize};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Title of the generated bank index.
pub const BANK_INDEX_TITLE: &str = "# Indice complessivo";

static NOTE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]\(([^)]+\.md)\)").expect("hard-coded regex")
});

/// Render the bank index from every collaborator's `main.md`.
///
/// Each collaborator gets a `## <name>` section holding their index with
/// level-1 headings dropped, deeper headings demoted by one level and every
/// link rewritten to an absolute path.
pub fn build_bank_index(registry: &Registry) -> Result<String> {
    let mut out = format!("{BANK_INDEX_TITLE}\n\n");

    for collaborator in registry.collaborators() {
        let index = std::fs::read_to_string(&collaborator.index_path)
            .map_err(|e| crate::Error::io(&collaborator.index_path, e))?;

        out.push_str(&format!("## {}\n\n", collaborator.name));
        for line in index.split_inclusive('\n') {
            if line.starts_with('#') && !line.starts_with("##") {
                continue;
            }
            let line = if line.starts_with("##") {
                format!("#{line}")
            } else {
                line.to_string()
            };
            out.push_str(&absolutize_links(&line, &collaborator.index_path));
        }
        out.push('\n');
    }

    Ok(out)
}

/// Notes selected by a bank index, with the collaborators they came from.
#[derive(Debug, Clone, Default)]
pub struct BankedNotes {
    /// Absolute note paths in index order.
    pub notes: Vec<PathBuf>,
    /// Collaborators that have a section in the index, in index order.
    pub collaborators: Vec<Collaborator>,
}

/// Heading level and text, for lines starting with `#`.
fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    (level > 0).then(|| (level, line[level..].trim()))
}

/// Resolve the note links of a bank index to files in collaborators' vaults.
///
/// Level-1 and level-2 headings switch the collaborator context. The level-1
/// title therefore also switches context; links directly under it belong to
/// no collaborator and are skipped.
pub fn resolve_banked_notes(
    index: &str,
    index_name: &str,
    registry: &Registry,
) -> Result<BankedNotes> {
    let mut banked = BankedNotes::default();
    let mut context: Option<&str> = None;

    for line in index.lines().map(str::trim) {
        if let Some((level, text)) = heading(line) {
            if level <= 2 {
                context = Some(text);
                if level == 2
                    && let Some(collaborator) = registry.get(text)
                    && !banked.collaborators.iter().any(|c| c.name == text)
                {
                    banked.collaborators.push(collaborator.clone());
                }
            }
            continue;
        }

        let Some(caps) = NOTE_LINK_RE.captures(line) else {
            continue;
        };
        let Some(name) = context else {
            continue;
        };
        let reference = &caps[1];

        let Some(collaborator) = registry.get(name).filter(|c| c.index_path.is_file()) else {
            tracing::warn!(collaborator = name, note = reference, "collaborator main.md not found, skipping");
            continue;
        };

        let note = normalize(&collaborator.vault_dir().join(reference));
        if note.is_file() {
            banked.notes.push(note);
        } else {
            tracing::warn!(
                collaborator = name,
                note = %note.display(),
                "note not found, skipping"
            );
        }
    }

    if banked.notes.is_empty() {
        return Err(BankError::NoResolvedNotes(index_name.to_string()).into());
    }
    tracing::debug!(
        notes = banked.notes.len(),
        collaborators = banked.collaborators.len(),
        "resolved banked notes"
    );
    Ok(banked)
}

/// Regenerate `main.md` at `output` from the registry at `registry_path`.
pub fn update_bank(registry_path: &Path, output: &Path) -> Result<()> {
    tracing::info!("updating collaborative bank");
    let registry = Registry::load(registry_path)?;
    registry.validate()?;

    let index = build_bank_index(&registry)?;
    std::fs::write(output, index).map_err(|e| crate::Error::io(output, e))?;
    tracing::info!(path = %output.display(), "bank index updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use indoc::indoc;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    /// Two collaborators with one topic each, plus the bank folder.
    fn team() -> (TempDir, Registry) {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for (who, topic) in [("alice", "algebra"), ("bob", "geometry")] {
            let vault = root.join(who).join("vault");
            fs::create_dir_all(vault.join(topic)).unwrap();
            fs::write(
                vault.join("main.md"),
                format!("# {who}\n\n## {topic}\n- [Intro]({topic}/main.{topic}.intro.md)\n"),
            )
            .unwrap();
            fs::write(
                vault.join(topic).join(format!("main.{topic}.intro.md")),
                format!("{who} says hi\n"),
            )
            .unwrap();
        }
        fs::create_dir_all(root.join("bank")).unwrap();
        let registry = Registry::parse(
            "## Alice\n- [v](../alice/vault/main.md)\n## Bob\n- [v](../bob/vault/main.md)\n",
            &root.join("bank"),
        );
        (dir, registry)
    }

    #[test]
    fn test_build_bank_index() {
        let (dir, registry) = team();
        let index = build_bank_index(&registry).unwrap();
        let alice = dir.path().join("alice/vault");

        let expected_alice = format!(
            "## Alice\n\n\n### algebra\n- [Intro]({}/algebra/main.algebra.intro.md)\n\n",
            alice.display()
        );
        assert!(index.starts_with("# Indice complessivo\n\n"));
        assert!(index.contains(&expected_alice), "{index}");
        assert!(index.contains("## Bob\n"));
        assert!(!index.contains("# alice"));
    }

    #[test]
    fn test_resolve_generated_index() {
        let (dir, registry) = team();
        let index = build_bank_index(&registry).unwrap();

        let banked = resolve_banked_notes(&index, "main.md", &registry).unwrap();
        assert_eq!(
            banked.notes,
            vec![
                dir.path().join("alice/vault/algebra/main.algebra.intro.md"),
                dir.path().join("bob/vault/geometry/main.geometry.intro.md"),
            ]
        );
        let names: Vec<&str> = banked.collaborators.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_resolve_relative_links_and_skips() {
        let (_dir, registry) = team();
        let index = indoc! {"
            ## Bob
            - [Intro](geometry/main.geometry.intro.md)
            - [Gone](geometry/main.geometry.gone.md)
            ## Carol
            - [Hers](x/main.x.a.md)
        "};
        let banked = resolve_banked_notes(index, "custom.md", &registry).unwrap();
        assert_eq!(banked.notes.len(), 1);
        assert_eq!(banked.collaborators.len(), 1);
    }

    #[test]
    fn test_level_one_heading_switches_context() {
        let (_dir, registry) = team();
        // The title clears the Alice context, so the link is not resolved.
        let index = "## Alice\n# Title\n- [Intro](algebra/main.algebra.intro.md)\n";
        let err = resolve_banked_notes(index, "main.md", &registry).unwrap_err();
        assert!(matches!(err, Error::Bank(BankError::NoResolvedNotes(name)) if name == "main.md"));
    }

    #[test]
    fn test_deeper_headings_keep_context() {
        let (_dir, registry) = team();
        let index = "## Alice\n### algebra\n- [Intro](algebra/main.algebra.intro.md)\n";
        let banked = resolve_banked_notes(index, "main.md", &registry).unwrap();
        assert_eq!(banked.notes.len(), 1);
    }

    #[test]
    fn test_update_bank_writes_index() {
        let (dir, _) = team();
        let bank = dir.path().join("bank");
        fs::write(
            bank.join("collaborator.md"),
            "## Alice\n- [v](../alice/vault/main.md)\n",
        )
        .unwrap();

        update_bank(&bank.join("collaborator.md"), &bank.join("main.md")).unwrap();
        let written = fs::read_to_string(bank.join("main.md")).unwrap();
        assert!(written.contains("## Alice"));
        assert!(!written.contains("## Bob"));
    }
}
