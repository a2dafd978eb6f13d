//! On-disk layout of a DocScript project.
//!
//! A project root holds either a `vault/` (one author) or a `bank/`
//! (several collaborators, recognised by its `collaborator.md`).

use crate::error::{Result, VaultError};
use std::path::{Path, PathBuf};

pub const VAULT_DIR: &str = "vault";
pub const BANK_DIR: &str = "bank";
pub const BUILD_DIR: &str = "build";
pub const ASSETS_DIR: &str = "assets";
pub const CONFIG_DIR: &str = "config";
pub const CONFIG_FILES_DIR: &str = "config-files";
/// Scratch folder users keep drafts in; never part of a conversion.
pub const SCRATCH_DIR: &str = "rusco";

pub const MAIN_INDEX: &str = "main.md";
pub const CUSTOM_INDEX: &str = "custom.md";
pub const COMBINED_FILE: &str = "combined_notes.md";
pub const COLLABORATOR_FILE: &str = "collaborator.md";
pub const CONFIG_FILE: &str = ".conf";

pub const NEW_NOTE_NAME: &str = "default-note.md";
pub const YAML_NAME: &str = "default-yaml.yaml";
pub const TEMPLATE_NAME: &str = "default-template.tex";
pub const LUA_FILTER_NAME: &str = "default-graphic.lua";
pub const PANDOC_OPT_NAME: &str = "default-pandoc-opt.yaml";

/// Marker line closing the generated header of a note.
pub const HEADER_SENTINEL: &str = "<!-- /code_chunk_output -->";

/// Directories never descended into when scanning a vault.
pub const EXCLUDED_DIRS: &[&str] = &[ASSETS_DIR, BUILD_DIR, CONFIG_DIR, SCRATCH_DIR];

/// File names that are never notes.
pub const EXCLUDED_FILES: &[&str] = &[COMBINED_FILE, NEW_NOTE_NAME, MAIN_INDEX, CUSTOM_INDEX];

/// Which index file drives a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// `main.md`, the complete ordered index.
    Main,
    /// `custom.md`, a hand-picked subset.
    Custom,
}

impl IndexKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            IndexKind::Main => MAIN_INDEX,
            IndexKind::Custom => CUSTOM_INDEX,
        }
    }
}

/// Whether the project is a private vault or a collaborative bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Vault,
    Bank,
}

/// Resolved locations of an initialized project.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    kind: ProjectKind,
}

impl Project {
    /// Inspect `root` and work out what kind of project it holds.
    pub fn detect(root: &Path) -> Result<Self> {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

        if root.join(BANK_DIR).join(COLLABORATOR_FILE).is_file() {
            return Ok(Self::new(root, ProjectKind::Bank));
        }
        if root.join(VAULT_DIR).is_dir() {
            return Ok(Self::new(root, ProjectKind::Vault));
        }

        Err(VaultError::NotInitialized(root).into())
    }

    pub fn new(root: PathBuf, kind: ProjectKind) -> Self {
        Self { root, kind }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> ProjectKind {
        self.kind
    }

    pub fn is_bank(&self) -> bool {
        self.kind == ProjectKind::Bank
    }

    /// The vault or bank directory.
    pub fn dir(&self) -> PathBuf {
        match self.kind {
            ProjectKind::Vault => self.root.join(VAULT_DIR),
            ProjectKind::Bank => self.root.join(BANK_DIR),
        }
    }

    pub fn build_dir(&self) -> PathBuf {
        self.dir().join(BUILD_DIR)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.dir().join(CONFIG_DIR)
    }

    /// Directory holding the default rendering assets written at init.
    pub fn config_files_dir(&self) -> PathBuf {
        self.config_dir().join(CONFIG_FILES_DIR)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join(CONFIG_FILE)
    }

    pub fn index_path(&self, kind: IndexKind) -> PathBuf {
        self.dir().join(kind.file_name())
    }

    pub fn combined_path(&self) -> PathBuf {
        self.build_dir().join(COMBINED_FILE)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join(BANK_DIR).join(COLLABORATOR_FILE)
    }
}
