//! Error types for the DocScript crate.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by every operation of the tool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Problems with the vault tree, its index files and its notes.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("no vault or bank found under {0}")]
    NotInitialized(PathBuf),

    #[error("{0} is already initialized as a vault")]
    AlreadyVault(PathBuf),

    #[error("{0} is already initialized as a bank")]
    AlreadyBank(PathBuf),

    #[error("this operation is only available in a private vault")]
    VaultOnly,

    #[error("this operation is only available in a bank")]
    BankOnly,

    #[error("index file {0} not found")]
    IndexMissing(PathBuf),

    #[error("no note references found in {0}")]
    EmptyIndex(String),

    #[error("no note references found for argument '{0}' in main.md")]
    EmptyGroup(String),

    #[error("note '{0}' was not found in the vault")]
    NoteNotFound(String),

    #[error("note '{0}' already exists")]
    NoteExists(PathBuf),

    #[error("macro-topic '{0}' does not exist, create its directory before adding notes")]
    MissingTopic(String),

    #[error("invalid note name '{name}': it must look like 'main.{topic}.<name>.md'")]
    InvalidNoteName { name: String, topic: String },

    #[error("the following .md files are NOT included in the index:\n{}", format_missing(.0))]
    Unindexed(Vec<String>),
}

fn format_missing(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("- {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Problems with the collaborator registry of a bank.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("collaborator registry {0} not found")]
    RegistryMissing(PathBuf),

    #[error("collaborator registry {0} already exists, run update-bank to refresh it")]
    RegistryExists(PathBuf),

    #[error("invalid collaborator links:\n{}", format_missing(.0))]
    InvalidLinks(Vec<String>),

    #[error("no note could be resolved from {0}")]
    NoResolvedNotes(String),
}

/// Problems with configuration files and CLI overrides.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("output file '{0}' must have a .pdf or .tex extension")]
    InvalidOutput(String),

    #[error("input file '{path}' must have a .{expected} extension")]
    WrongExtension { path: PathBuf, expected: &'static str },

    #[error("input file '{0}' not found")]
    MissingFile(PathBuf),
}

/// Problems with the external rendering toolchain.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{0} is not installed or not in PATH")]
    ToolMissing(String),

    #[error("GNU FreeFont fonts are not installed")]
    FontsMissing,

    #[error("rendering asset {0} not found")]
    AssetMissing(PathBuf),

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with code {code}")]
    ToolFailed { tool: String, code: i32 },
}
