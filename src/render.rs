//! Rendering the combined Markdown through the external toolchain.
//!
//! [`Renderer`] is the seam between the conversion workflow and pandoc.
//! [`PandocRenderer`] is the real implementation; tests plug in a recorder.

use crate::error::{Error, RenderError, Result};
use crate::paths::{is_network_path, tool_path};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Font families of GNU FreeFont the default template relies on.
const FREEFONT_FAMILIES: &[&str] = &["FreeSerif", "FreeSans", "FreeMono"];

/// Everything needed to turn one combined file into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// Combined Markdown file.
    pub input: PathBuf,
    /// Requested output, `.pdf` or `.tex`.
    pub output: PathBuf,
    /// Directory the tools run in.
    pub work_dir: PathBuf,
    pub template: PathBuf,
    pub lua_filter: PathBuf,
    pub pandoc_defaults: PathBuf,
}

impl RenderJob {
    fn assets(&self) -> [&Path; 3] {
        [self.template.as_path(), self.lua_filter.as_path(), self.pandoc_defaults.as_path()]
    }
}

/// Turns a [`RenderJob`] into an output document.
pub trait Renderer {
    /// Fail early when the toolchain or the job's assets are unavailable.
    fn preflight(&self, job: &RenderJob) -> Result<()>;

    /// Produce the document, returning the path of the final artifact.
    fn render(&self, job: &RenderJob) -> Result<PathBuf>;
}

/// pandoc with the xelatex engine, optionally finished by latexmk.
#[derive(Debug, Clone, Default)]
pub struct PandocRenderer {
    /// Force (or forbid) the two-step network build; detected when unset.
    network: Option<bool>,
}

impl PandocRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network_mode(mut self, network: bool) -> Self {
        self.network = Some(network);
        self
    }

    fn is_network(&self, job: &RenderJob) -> bool {
        self.network.unwrap_or_else(|| is_network_path(&job.work_dir))
    }

    /// Whether the job needs latexmk after pandoc.
    fn needs_latexmk(&self, job: &RenderJob) -> bool {
        self.is_network(job) && !has_extension(&job.output, "tex")
    }

    fn run_pandoc(&self, job: &RenderJob, output: &Path) -> Result<()> {
        let mut command = Command::new("pandoc");
        command
            .arg(tool_path(&job.input))
            .arg("-o")
            .arg(tool_path(output))
            .arg(format!("--defaults={}", tool_path(&job.pandoc_defaults)))
            .arg(format!("--template={}", tool_path(&job.template)))
            .arg(format!("--lua-filter={}", tool_path(&job.lua_filter)))
            .current_dir(&job.work_dir);
        run("pandoc", &mut command)
    }

    fn run_latexmk(&self, job: &RenderJob, tex: &Path) -> Result<()> {
        let file_name = tex.file_name().unwrap_or(OsStr::new(""));
        let mut command = Command::new("latexmk");
        command.arg("-xelatex").arg(file_name).current_dir(&job.work_dir);
        run("latexmk", &mut command)
    }
}

impl Renderer for PandocRenderer {
    fn preflight(&self, job: &RenderJob) -> Result<()> {
        let mut tools = vec!["xelatex", "pandoc"];
        if self.needs_latexmk(job) {
            tools.push("latexmk");
        }
        for tool in tools {
            let path = which::which(tool).map_err(|_| RenderError::ToolMissing(tool.to_string()))?;
            tracing::info!(tool, path = %path.display(), "found");
        }

        if !freefont_installed() {
            return Err(RenderError::FontsMissing.into());
        }
        tracing::info!("GNU FreeFont fonts found");

        for asset in job.assets() {
            if !asset.is_file() {
                return Err(RenderError::AssetMissing(asset.to_path_buf()).into());
            }
        }
        Ok(())
    }

    fn render(&self, job: &RenderJob) -> Result<PathBuf> {
        if !self.needs_latexmk(job) {
            self.run_pandoc(job, &job.output)?;
            return Ok(job.output.clone());
        }

        tracing::info!(work_dir = %job.work_dir.display(), "network build directory, rendering through latexmk");
        let tex = job.output.with_extension("tex");
        self.run_pandoc(job, &tex)?;
        self.run_latexmk(job, &tex)?;

        let removed = remove_by_products(&tex)?;
        tracing::debug!(removed, "latexmk by-products removed");
        Ok(job.output.with_extension("pdf"))
    }
}

/// Run a tool to completion; a non-zero exit is an error.
fn run(tool: &str, command: &mut Command) -> Result<()> {
    tracing::info!(command = ?command, "running");
    let status = command.status().map_err(|source| RenderError::Spawn {
        tool: tool.to_string(),
        source,
    })?;
    if !status.success() {
        return Err(RenderError::ToolFailed {
            tool: tool.to_string(),
            code: status.code().unwrap_or(-1),
        }
        .into());
    }
    Ok(())
}

fn freefont_installed() -> bool {
    match Command::new("fc-list").output() {
        Ok(output) if output.status.success() => {
            let listing = String::from_utf8_lossy(&output.stdout);
            FREEFONT_FAMILIES.iter().any(|family| listing.contains(family))
        }
        Ok(_) => false,
        Err(error) => {
            tracing::debug!(%error, "fc-list unavailable");
            false
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Delete files named `<stem>.*` next to `tex`, keeping the `.tex` and `.pdf`.
pub fn remove_by_products(tex: &Path) -> Result<usize> {
    let Some(folder) = tex.parent() else {
        return Ok(0);
    };
    let stem = tex
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("{stem}.");
    let keep = [format!("{stem}.pdf"), format!("{stem}.tex")];

    let mut removed = 0;
    let entries = std::fs::read_dir(folder).map_err(|e| Error::io(folder, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(folder, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_file = entry.file_type().is_ok_and(|kind| kind.is_file());
        if is_file && name.starts_with(&prefix) && !keep.contains(&name) {
            tracing::debug!(file = %name, "removing");
            std::fs::remove_file(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn job(dir: &Path, output: &str) -> RenderJob {
        RenderJob {
            input: dir.join("combined_notes.md"),
            output: dir.join(output),
            work_dir: dir.to_path_buf(),
            template: dir.join("t.tex"),
            lua_filter: dir.join("f.lua"),
            pandoc_defaults: dir.join("o.yaml"),
        }
    }

    #[test]
    fn test_remove_by_products() {
        let dir = tempdir().unwrap();
        for name in ["notes.tex", "notes.pdf", "notes.aux", "notes.log", "notes.fdb_latexmk", "notesx.aux", "other.log"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let removed = remove_by_products(&dir.path().join("notes.tex")).unwrap();
        assert_eq!(removed, 3);

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["notes.pdf", "notes.tex", "notesx.aux", "other.log"]);
    }

    #[test]
    fn test_latexmk_only_for_network_pdf() {
        let dir = tempdir().unwrap();
        let network = PandocRenderer::new().with_network_mode(true);
        let local = PandocRenderer::new().with_network_mode(false);

        assert!(network.needs_latexmk(&job(dir.path(), "notes.pdf")));
        assert!(!network.needs_latexmk(&job(dir.path(), "notes.TEX")));
        assert!(!local.needs_latexmk(&job(dir.path(), "notes.pdf")));
    }
}
