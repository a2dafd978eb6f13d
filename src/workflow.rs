//! Conversion workflows: which notes go into a document and how it is built.
//!
//! Every mode ends the same way: a `combined_notes.md` in a build folder,
//! the YAML block propagated onto it, and one [`Renderer`] call.

use crate::bank::{self, Registry};
use crate::config::{Settings, validate_output};
use crate::error::{Error, Result, VaultError};
use crate::render::{RenderJob, Renderer};
use crate::vault::layout::{
    ASSETS_DIR, BUILD_DIR, COMBINED_FILE, CONFIG_DIR, LUA_FILTER_NAME, PANDOC_OPT_NAME,
    TEMPLATE_NAME,
};
use crate::vault::{
    IndexKind, NoteCombiner, VaultScanner, check_consistency, group_references,
    index_references, propagate_yaml, read_index, strip_header, write_combined,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Attempts made at removing the staging folder.
const STAGING_REMOVE_ATTEMPTS: usize = 3;

/// Pause between removal attempts; xelatex may still hold file locks.
const STAGING_RETRY_DELAY: Duration = Duration::from_secs(1);

/// What to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionMode {
    /// A single note, looked up by file name.
    One { note: String },
    /// The notes of one macro-topic listed in `main.md`.
    Group { argument: String },
    /// Everything listed in `main.md`.
    All,
    /// Everything listed in `custom.md`.
    Custom,
}

impl ConversionMode {
    fn name(&self) -> &'static str {
        match self {
            ConversionMode::One { .. } => "one",
            ConversionMode::Group { .. } => "group",
            ConversionMode::All => "all",
            ConversionMode::Custom => "custom",
        }
    }
}

/// Run a conversion and return the path of the produced document.
///
/// `output` must be a `.pdf` or `.tex` file name; only its last component
/// is used and the document lands in the project's build folder.
pub fn convert(
    settings: &Settings,
    renderer: &dyn Renderer,
    mode: &ConversionMode,
    output: &str,
) -> Result<PathBuf> {
    validate_output(output)?;
    let output_name = Path::new(output)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(output));

    tracing::info!(mode = mode.name(), output = %output_name.display(), "conversion started");

    let artifact = if settings.project.is_bank() {
        match mode {
            ConversionMode::All => convert_bank(settings, renderer, IndexKind::Main, &output_name)?,
            ConversionMode::Custom => {
                convert_bank(settings, renderer, IndexKind::Custom, &output_name)?
            }
            ConversionMode::One { .. } | ConversionMode::Group { .. } => {
                return Err(VaultError::VaultOnly.into());
            }
        }
    } else {
        convert_vault(settings, renderer, mode, &output_name)?
    };

    tracing::info!(path = %artifact.display(), "conversion finished");
    Ok(artifact)
}

fn render_job(input: PathBuf, output_name: &Path, work_dir: PathBuf, settings: &Settings) -> RenderJob {
    RenderJob {
        input,
        output: work_dir.join(output_name),
        work_dir,
        template: settings.template.clone(),
        lua_filter: settings.lua_filter.clone(),
        pandoc_defaults: settings.pandoc_defaults.clone(),
    }
}

fn convert_vault(
    settings: &Settings,
    renderer: &dyn Renderer,
    mode: &ConversionMode,
    output_name: &Path,
) -> Result<PathBuf> {
    let project = &settings.project;
    let build_dir = project.build_dir();
    let combined_path = project.combined_path();
    let scanner = VaultScanner::new(project.dir());
    let main_index = project.index_path(IndexKind::Main);

    let (content, yaml_index) = match mode {
        ConversionMode::One { note } => {
            let path = scanner
                .find_note(note)
                .ok_or_else(|| VaultError::NoteNotFound(note.clone()))?;
            tracing::info!(path = %path.display(), "note found");
            let raw = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            (strip_header(&raw), main_index)
        }
        ConversionMode::Group { argument } => {
            let references = group_references(&main_index, argument)?;
            check_consistency(&references, &scanner.scan_argument(argument))?;
            (combine(project.dir(), &references)?, main_index)
        }
        ConversionMode::All => {
            let references = index_references(&main_index)?;
            check_consistency(&references, &scanner.scan())?;
            (combine(project.dir(), &references)?, main_index)
        }
        ConversionMode::Custom => {
            let custom_index = project.index_path(IndexKind::Custom);
            let references = index_references(&custom_index)?;
            (combine(project.dir(), &references)?, custom_index)
        }
    };

    let job = render_job(combined_path.clone(), output_name, build_dir, settings);
    renderer.preflight(&job)?;

    let content = with_yaml(settings, &content, &yaml_index)?;
    write_combined(&combined_path, &content)?;
    let rendered = renderer.render(&job);

    // The single-note combined file is temporary, rendered or not.
    if matches!(mode, ConversionMode::One { .. }) {
        fs::remove_file(&combined_path).map_err(|e| Error::io(&combined_path, e))?;
    }
    rendered
}

fn combine(root: PathBuf, references: &[String]) -> Result<String> {
    Ok(NoteCombiner::new(root).combine(references)?.content)
}

/// Propagate the YAML block from the configured file, else from the index.
///
/// A missing index is not an error here; the document just gets no block.
fn with_yaml(settings: &Settings, content: &str, index: &Path) -> Result<String> {
    let source_path = settings.yaml.as_deref().unwrap_or(index);
    let source = match fs::read_to_string(source_path) {
        Ok(source) => source,
        Err(error) if settings.yaml.is_none() && error.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(index = %index.display(), "no index to take front matter from");
            return Ok(content.to_string());
        }
        Err(error) => return Err(Error::io(source_path, error)),
    };
    let source_name = source_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(propagate_yaml(content, &source, &source_name))
}

/// Scratch folder for bank builds, removed when dropped.
struct Staging {
    path: PathBuf,
}

impl Staging {
    fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "clearing stale staging folder");
            fs::remove_dir_all(path).map_err(|e| Error::io(path, e))?;
        }
        for sub in [BUILD_DIR, ASSETS_DIR, CONFIG_DIR] {
            let dir = path.join(sub);
            fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn dir(&self, sub: &str) -> PathBuf {
        self.path.join(sub)
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        for attempt in 1..=STAGING_REMOVE_ATTEMPTS {
            match fs::remove_dir_all(&self.path) {
                Ok(()) => return,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => return,
                Err(error) => {
                    tracing::warn!(path = %self.path.display(), attempt, %error, "failed to remove staging folder");
                    if attempt < STAGING_REMOVE_ATTEMPTS {
                        std::thread::sleep(STAGING_RETRY_DELAY);
                    }
                }
            }
        }
    }
}

fn convert_bank(
    settings: &Settings,
    renderer: &dyn Renderer,
    kind: IndexKind,
    output_name: &Path,
) -> Result<PathBuf> {
    let project = &settings.project;
    let index_path = project.index_path(kind);
    let index = read_index(&index_path)?;
    let registry = Registry::load(&project.registry_path())?;
    let banked = bank::resolve_banked_notes(&index, kind.file_name(), &registry)?;

    let staging = Staging::create(&settings.staging_dir)?;
    tracing::info!(path = %staging.path.display(), "staging bank build");

    let config = staging.dir(CONFIG_DIR);
    let staged_assets = [
        (&settings.template, TEMPLATE_NAME),
        (&settings.lua_filter, LUA_FILTER_NAME),
        (&settings.pandoc_defaults, PANDOC_OPT_NAME),
    ];
    for (source, name) in staged_assets {
        let target = config.join(name);
        fs::copy(source, &target).map_err(|e| Error::io(source, e))?;
    }

    let build = staging.dir(BUILD_DIR);
    let job = RenderJob {
        input: build.join(COMBINED_FILE),
        output: build.join(output_name),
        work_dir: build.clone(),
        template: config.join(TEMPLATE_NAME),
        lua_filter: config.join(LUA_FILTER_NAME),
        pandoc_defaults: config.join(PANDOC_OPT_NAME),
    };
    renderer.preflight(&job)?;

    bank::merge_assets(&banked.collaborators, &staging.dir(ASSETS_DIR))?;

    let document = NoteCombiner::new(project.dir()).combine(&banked.notes)?;
    let content = with_yaml(settings, &document.content, &index_path)?;
    write_combined(&job.input, &content)?;

    let rendered = renderer.render(&job)?;

    let build_dir = project.build_dir();
    fs::create_dir_all(&build_dir).map_err(|e| Error::io(&build_dir, e))?;
    let artifact = build_dir.join(rendered.file_name().unwrap_or(output_name.as_os_str()));
    fs::copy(&rendered, &artifact).map_err(|e| Error::io(&rendered, e))?;
    Ok(artifact)
}

/// Regenerate the bank's `main.md` from the collaborator registry.
pub fn update_bank(settings: &Settings) -> Result<PathBuf> {
    let project = &settings.project;
    if !project.is_bank() {
        return Err(VaultError::BankOnly.into());
    }
    let output = project.index_path(IndexKind::Main);
    bank::update_bank(&project.registry_path(), &output)?;
    Ok(output)
}
