//! Configuration snapshot for one invocation.
//!
//! Settings are layered once, before any work starts: built-in defaults,
//! then the project's `config/.conf`, then CLI flags. The resulting
//! [`Settings`] value is never mutated afterwards.
//!
//! `.conf` lines look like `.template="./config-files/book.tex"`. Lines not
//! starting with `.` and lines not matching the pattern are ignored. Values
//! are relative to the `config/` directory.

use crate::error::{ConfigError, Error, Result};
use crate::vault::layout::{
    LUA_FILTER_NAME, NEW_NOTE_NAME, PANDOC_OPT_NAME, Project, TEMPLATE_NAME,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static CONF_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\.(\w+)\s*=\s*"([^"]+)"$"#).expect("hard-coded regex"));

/// Name of the staging folder used for bank conversions.
const STAGING_DIR_NAME: &str = "DocScript";

/// A path setting that can be overridden by `.conf` or the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfKey {
    /// LaTeX template handed to pandoc.
    Template,
    /// Lua filter handed to pandoc.
    Lua,
    /// YAML block source for the combined document.
    Yaml,
    /// Starting content for new notes.
    Start,
    /// pandoc `--defaults` file.
    Pandoc,
}

impl ConfKey {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "template" => Some(ConfKey::Template),
            "lua" => Some(ConfKey::Lua),
            "yaml" => Some(ConfKey::Yaml),
            "start" => Some(ConfKey::Start),
            "pandoc" => Some(ConfKey::Pandoc),
            _ => None,
        }
    }

    /// Extension the referenced file must carry.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfKey::Template => "tex",
            ConfKey::Lua => "lua",
            ConfKey::Yaml | ConfKey::Pandoc => "yaml",
            ConfKey::Start => "md",
        }
    }
}

/// Parse the recognised `.key="value"` entries of a `.conf` file.
pub fn parse_conf(text: &str) -> Vec<(ConfKey, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('.'))
        .filter_map(|line| {
            let caps = CONF_LINE_RE.captures(line)?;
            match ConfKey::parse(&caps[1]) {
                Some(key) => Some((key, caps[2].to_string())),
                None => {
                    tracing::debug!(key = &caps[1], "ignoring unknown configuration key");
                    None
                }
            }
        })
        .collect()
}

/// Path overrides coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub yaml: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub lua: Option<PathBuf>,
    pub pandoc: Option<PathBuf>,
}

/// Immutable configuration for one run of the tool.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project: Project,
    /// LaTeX template.
    pub template: PathBuf,
    /// Lua filter.
    pub lua_filter: PathBuf,
    /// pandoc defaults file.
    pub pandoc_defaults: PathBuf,
    /// Template copied when starting a new note.
    pub note_template: PathBuf,
    /// Explicit YAML source; the index file is used when unset.
    pub yaml: Option<PathBuf>,
    /// Scratch area for bank conversions.
    pub staging_dir: PathBuf,
}

/// Layers defaults, the `.conf` file and CLI overrides into [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Start from the defaults written into `config/config-files` at init.
    pub fn new(project: Project) -> Self {
        let assets = project.config_files_dir();
        let staging_dir = dirs::document_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
            .unwrap_or_else(std::env::temp_dir)
            .join(STAGING_DIR_NAME);

        Self {
            settings: Settings {
                template: assets.join(TEMPLATE_NAME),
                lua_filter: assets.join(LUA_FILTER_NAME),
                pandoc_defaults: assets.join(PANDOC_OPT_NAME),
                note_template: assets.join(NEW_NOTE_NAME),
                yaml: None,
                staging_dir,
                project,
            },
        }
    }

    /// Apply the project's `.conf`, if it exists.
    pub fn with_config_file(mut self) -> Result<Self> {
        let conf_path = self.settings.project.config_file();
        let text = match std::fs::read_to_string(&conf_path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %conf_path.display(), "no configuration file");
                return Ok(self);
            }
            Err(error) => return Err(Error::io(conf_path, error)),
        };

        let config_dir = self.settings.project.config_dir();
        for (key, value) in parse_conf(&text) {
            let path = crate::markdown::links::normalize(&config_dir.join(value));
            self.set(key, path)?;
        }
        tracing::debug!(path = %conf_path.display(), "configuration file applied");
        Ok(self)
    }

    /// Apply CLI flags; relative paths are taken from the working directory.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Result<Self> {
        let entries = [
            (ConfKey::Yaml, &overrides.yaml),
            (ConfKey::Template, &overrides.template),
            (ConfKey::Lua, &overrides.lua),
            (ConfKey::Pandoc, &overrides.pandoc),
        ];
        for (key, value) in entries {
            if let Some(path) = value {
                let path = std::path::absolute(path).map_err(|e| Error::io(path, e))?;
                tracing::info!(?key, path = %path.display(), "using custom file");
                self.set(key, path)?;
            }
        }
        Ok(self)
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.staging_dir = dir.into();
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }

    fn set(&mut self, key: ConfKey, path: PathBuf) -> Result<()> {
        let path = validate_input(&path, key.extension())?;
        match key {
            ConfKey::Template => self.settings.template = path,
            ConfKey::Lua => self.settings.lua_filter = path,
            ConfKey::Yaml => self.settings.yaml = Some(path),
            ConfKey::Start => self.settings.note_template = path,
            ConfKey::Pandoc => self.settings.pandoc_defaults = path,
        }
        Ok(())
    }
}

/// Check a user-supplied file: right extension and present on disk.
pub fn validate_input(path: &Path, extension: &'static str) -> Result<PathBuf> {
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
    if !matches {
        return Err(ConfigError::WrongExtension {
            path: path.to_path_buf(),
            expected: extension,
        }
        .into());
    }
    if !path.is_file() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }
    Ok(path.to_path_buf())
}

/// Check that a conversion output is a `.pdf` or `.tex` file name.
pub fn validate_output(output: &str) -> Result<()> {
    let extension = Path::new(output)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf" | "tex") => Ok(()),
        _ => Err(ConfigError::InvalidOutput(output.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::layout::{CONFIG_FILE, ProjectKind};
    use indoc::indoc;
    use std::fs;
    use tempfile::tempdir;

    fn vault_project(root: &Path) -> Project {
        let project = Project::new(root.to_path_buf(), ProjectKind::Vault);
        fs::create_dir_all(project.config_files_dir()).unwrap();
        project
    }

    #[test]
    fn test_parse_conf() {
        let text = indoc! {r#"
            # default configuration - start path from config/
            .pandoc="./config-files/default-pandoc-opt.yaml"
            .yaml = "./config-files/default-yaml.yaml"
            .unknown="./x"
            template="./ignored.tex"
            .lua="unterminated
        "#};
        let entries = parse_conf(text);
        assert_eq!(
            entries,
            vec![
                (ConfKey::Pandoc, "./config-files/default-pandoc-opt.yaml".to_string()),
                (ConfKey::Yaml, "./config-files/default-yaml.yaml".to_string()),
            ]
        );
    }

    #[test]
    fn test_validate_output() {
        assert!(validate_output("notes.pdf").is_ok());
        assert!(validate_output("notes.TEX").is_ok());
        assert!(validate_output("notes.docx").is_err());
        assert!(validate_output("notes").is_err());
    }

    #[test]
    fn test_validate_input() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("book.tex");
        fs::write(&good, "").unwrap();

        assert!(validate_input(&good, "tex").is_ok());
        assert!(matches!(
            validate_input(&good, "lua"),
            Err(Error::Config(ConfigError::WrongExtension { .. }))
        ));
        assert!(matches!(
            validate_input(&dir.path().join("missing.tex"), "tex"),
            Err(Error::Config(ConfigError::MissingFile(_)))
        ));
    }

    #[test]
    fn test_defaults_point_at_config_files() {
        let dir = tempdir().unwrap();
        let project = vault_project(dir.path());
        let settings = SettingsBuilder::new(project).build();

        assert!(settings.template.ends_with("vault/config/config-files/default-template.tex"));
        assert!(settings.yaml.is_none());
    }

    #[test]
    fn test_config_file_then_cli_overrides() {
        let dir = tempdir().unwrap();
        let project = vault_project(dir.path());
        let files = project.config_files_dir();
        fs::write(files.join("book.tex"), "").unwrap();
        fs::write(files.join("meta.yaml"), "---\n---\n").unwrap();
        fs::write(
            project.config_dir().join(CONFIG_FILE),
            ".template=\"./config-files/book.tex\"\n.yaml=\"./config-files/meta.yaml\"\n",
        )
        .unwrap();

        let cli_yaml = dir.path().join("cli.yaml");
        fs::write(&cli_yaml, "---\n---\n").unwrap();

        let settings = SettingsBuilder::new(project)
            .with_config_file()
            .unwrap()
            .with_overrides(&Overrides {
                yaml: Some(cli_yaml.clone()),
                ..Default::default()
            })
            .unwrap()
            .build();

        assert!(settings.template.ends_with("config-files/book.tex"));
        assert_eq!(settings.yaml.as_deref(), Some(cli_yaml.as_path()));
    }

    #[test]
    fn test_config_file_with_missing_target_fails() {
        let dir = tempdir().unwrap();
        let project = vault_project(dir.path());
        fs::write(project.config_file(), ".lua=\"./config-files/nope.lua\"\n").unwrap();

        let result = SettingsBuilder::new(project).with_config_file();
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingFile(_)))
        ));
    }
}
