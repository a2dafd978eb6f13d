//! The collaborator registry (`bank/collaborator.md`).
//!
//! ```markdown
//! ## Alice
//! - [vault](../../alice/vault/main.md)
//! ```
//!
//! A `##` heading names a collaborator, the next `main.md` link points at
//! their vault index. Link targets are relative to the registry's folder.

use crate::error::{BankError, Error, Result};
use crate::markdown::links::normalize;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static INDEX_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]\(([^)]*main\.md)\)").expect("hard-coded regex")
});

/// One registered collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collaborator {
    pub name: String,
    /// Absolute path to the collaborator's `main.md`.
    pub index_path: PathBuf,
}

impl Collaborator {
    /// Folder holding the collaborator's index; note links resolve from here.
    pub fn vault_dir(&self) -> &Path {
        self.index_path.parent().unwrap_or(Path::new(""))
    }
}

/// Ordered collaborator name to index mapping.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    collaborators: Vec<Collaborator>,
    /// Links found outside of any `##` section.
    orphan_links: Vec<String>,
}

impl Registry {
    /// Read and parse the registry file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(BankError::RegistryMissing(path.to_path_buf()).into());
            }
            Err(error) => return Err(Error::io(path, error)),
        };
        let base = path.parent().unwrap_or(Path::new(""));
        let base = std::path::absolute(base).map_err(|e| Error::io(base, e))?;
        Ok(Self::parse(&text, &base))
    }

    /// Parse registry text; `base` is the folder the registry lives in.
    pub fn parse(text: &str, base: &Path) -> Self {
        let mut registry = Self::default();
        let mut current: Option<String> = None;

        for line in text.lines().map(str::trim) {
            if line.starts_with("##") {
                current = Some(line.trim_start_matches('#').trim().to_string());
            }
            let Some(caps) = INDEX_LINK_RE.captures(line) else {
                continue;
            };
            let target = &caps[1];
            match &current {
                Some(name) => registry.insert(Collaborator {
                    name: name.clone(),
                    index_path: normalize(&base.join(target)),
                }),
                None => registry.orphan_links.push(target.to_string()),
            }
        }
        registry
    }

    fn insert(&mut self, collaborator: Collaborator) {
        match self
            .collaborators
            .iter_mut()
            .find(|existing| existing.name == collaborator.name)
        {
            Some(existing) => existing.index_path = collaborator.index_path,
            None => self.collaborators.push(collaborator),
        }
    }

    /// Check every link, reporting all failures at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = self
            .orphan_links
            .iter()
            .map(|link| format!("link '{link}' is not under a collaborator heading"))
            .collect();

        for collaborator in &self.collaborators {
            if collaborator.index_path.is_file() {
                tracing::info!(
                    collaborator = %collaborator.name,
                    index = %collaborator.index_path.display(),
                    "collaborator index found"
                );
            } else {
                errors.push(format!(
                    "collaborator '{}': main.md not found at '{}'",
                    collaborator.name,
                    collaborator.index_path.display()
                ));
            }
        }

        if !errors.is_empty() {
            return Err(BankError::InvalidLinks(errors).into());
        }
        tracing::info!(count = self.collaborators.len(), "all collaborator links are valid");
        Ok(())
    }

    pub fn collaborators(&self) -> &[Collaborator] {
        &self.collaborators
    }

    pub fn get(&self, name: &str) -> Option<&Collaborator> {
        self.collaborators.iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.collaborators.is_empty()
    }
}
