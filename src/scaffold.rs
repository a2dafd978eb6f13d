//! Project scaffolding: `init-vault`, `init-bank` and `start-note`.
//!
//! Skeleton files are compiled into the binary from `templates/`:
//! `vault/` and `bank/` hold the per-kind skeletons, `config-files/` the
//! default rendering assets both kinds share.

use crate::config::Settings;
use crate::error::{ConfigError, Error, Result, VaultError};
use crate::vault::layout::{
    ASSETS_DIR, BANK_DIR, BUILD_DIR, CONFIG_FILES_DIR, LUA_FILTER_NAME, MAIN_INDEX,
    NEW_NOTE_NAME, PANDOC_OPT_NAME, Project, ProjectKind, TEMPLATE_NAME, VAULT_DIR, YAML_NAME,
};
use regex::Regex;
use rust_embed::Embed;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Embed)]
#[folder = "templates/"]
struct Templates;

/// Initial `main.md` of a fresh vault.
const STARTER_INDEX: &str = "# Argomento 1\n\n- [NomeArgomento1](main-arg1/main.main-arg1.first-note.md)\n";

/// Write every embedded file under `prefix/` into `dest`.
fn extract(prefix: &str, dest: &Path) -> Result<usize> {
    let prefix = format!("{prefix}/");
    let mut written = 0;

    for name in Templates::iter() {
        let Some(relative) = name.strip_prefix(&prefix) else {
            continue;
        };
        let Some(file) = Templates::get(&name) else {
            continue;
        };
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&target, file.data.as_ref()).map_err(|e| Error::io(&target, e))?;
        written += 1;
    }
    Ok(written)
}

/// Text of the `config/.conf` written at init.
pub fn default_conf(kind: ProjectKind) -> String {
    let entry = |key: &str, file: &str| format!(".{key}=\"./{CONFIG_FILES_DIR}/{file}\"\n");

    let mut conf = String::from("# default configuration - start path from config/\n");
    conf.push_str(&entry("pandoc", PANDOC_OPT_NAME));
    conf.push_str(&entry("yaml", YAML_NAME));
    conf.push_str(&entry("template", TEMPLATE_NAME));
    conf.push_str(&entry("lua", LUA_FILTER_NAME));
    if kind == ProjectKind::Vault {
        conf.push_str(&entry("start", NEW_NOTE_NAME));
    }
    conf
}

fn write_config(project: &Project) -> Result<()> {
    extract(CONFIG_FILES_DIR, &project.config_files_dir())?;
    let conf_path = project.config_file();
    fs::write(&conf_path, default_conf(project.kind())).map_err(|e| Error::io(&conf_path, e))?;
    tracing::info!(path = %conf_path.display(), "configuration written");
    Ok(())
}

/// Whether `dir` holds anything besides a build folder.
fn has_content(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        if entry.file_name() != BUILD_DIR {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Create the vault skeleton under `root`.
pub fn init_vault(root: &Path) -> Result<Project> {
    if root.join(BANK_DIR).exists() {
        return Err(VaultError::AlreadyBank(root.to_path_buf()).into());
    }
    if has_content(&root.join(VAULT_DIR))? {
        return Err(VaultError::AlreadyVault(root.to_path_buf()).into());
    }

    let project = Project::new(root.to_path_buf(), ProjectKind::Vault);
    let vault = project.dir();
    tracing::info!(path = %vault.display(), "creating vault");

    extract(VAULT_DIR, &vault)?;
    let index = vault.join(MAIN_INDEX);
    fs::write(&index, STARTER_INDEX).map_err(|e| Error::io(&index, e))?;
    let assets = vault.join(ASSETS_DIR);
    fs::create_dir_all(&assets).map_err(|e| Error::io(&assets, e))?;

    write_config(&project)?;
    tracing::info!("vault ready");
    Ok(project)
}

/// Create the bank skeleton under `root`.
pub fn init_bank(root: &Path) -> Result<Project> {
    let project = Project::new(root.to_path_buf(), ProjectKind::Bank);
    let registry = project.registry_path();

    if registry.exists() {
        return Err(crate::error::BankError::RegistryExists(registry).into());
    }
    if root.join(VAULT_DIR).exists() {
        return Err(VaultError::AlreadyVault(root.to_path_buf()).into());
    }
    if root.join(BANK_DIR).exists() {
        return Err(VaultError::AlreadyBank(root.to_path_buf()).into());
    }

    tracing::info!(path = %project.dir().display(), "creating bank");
    extract(BANK_DIR, &project.dir())?;
    write_config(&project)?;

    tracing::info!(
        registry = %registry.display(),
        "bank ready, list your collaborators then run update-bank"
    );
    Ok(project)
}

/// Create `vault/<topic>/<name>` from the start template.
///
/// `note` is `<topic>/main.<topic>[.<anything>].md`; the topic folder must
/// already exist and existing notes are never overwritten.
pub fn start_note(settings: &Settings, note: &str) -> Result<PathBuf> {
    let project = &settings.project;
    if project.is_bank() {
        return Err(VaultError::VaultOnly.into());
    }

    let template = &settings.note_template;
    if !template.is_file() {
        return Err(ConfigError::MissingFile(template.clone()).into());
    }

    let topic = note.split(['/', '\\']).next().unwrap_or_default();
    let vault = project.dir();
    if topic.is_empty() || !vault.join(topic).is_dir() {
        return Err(VaultError::MissingTopic(topic.to_string()).into());
    }

    let name = Path::new(note)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let pattern = format!(r"^main\.{}(?:\..+)?\.md$", regex::escape(topic));
    let valid = Regex::new(&pattern).is_ok_and(|re| re.is_match(&name));
    if !valid {
        return Err(VaultError::InvalidNoteName {
            name,
            topic: topic.to_string(),
        }
        .into());
    }

    let path = vault.join(note);
    if path.exists() {
        return Err(VaultError::NoteExists(path).into());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::copy(template, &path).map_err(|e| Error::io(template, e))?;

    tracing::info!(path = %path.display(), "note created");
    Ok(path)
}
