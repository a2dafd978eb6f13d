//! Markdown link scanning.
//!
//! Index files are scanned with plain text matching rather than a Markdown
//! parser: on each line the text between the first `(` and the first `)` is
//! the candidate target. A line holding several links therefore yields only
//! its first one.

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("hard-coded regex"));

/// Extract the first parenthesized target of a line, if it is a `.md` link.
pub fn link_target(line: &str) -> Option<&str> {
    let start = line.find('(')? + 1;
    let end = line.find(')')?;
    // A `)` before the first `(` is not a link
    let target = line.get(start..end)?;
    target.ends_with(".md").then_some(target)
}

/// Collect every `.md` link target in document order.
pub fn scan_links<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter(|line| line.contains('(') && line.contains(')'))
        .filter_map(link_target)
        .map(str::to_string)
        .collect()
}

/// Collect the `.md` link targets that live under a macro-topic folder.
///
/// Only lines containing `(<argument>/` are considered, and only targets
/// starting with `<argument>/` are kept.
pub fn scan_links_for_argument<'a, I>(lines: I, argument: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let marker = format!("({argument}/");
    let prefix = format!("{argument}/");

    lines
        .into_iter()
        .filter(|line| line.contains(&marker))
        .filter_map(link_target)
        .filter(|target| target.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

/// Rewrite every `[label](target)` of a line so the target is absolute.
///
/// Targets are resolved against the directory holding `index_path` and
/// written with forward slashes, so the rewritten text stays valid wherever
/// it is copied to.
pub fn absolutize_links(line: &str, index_path: &Path) -> String {
    let base = index_path.parent().unwrap_or(Path::new(""));
    let base = std::path::absolute(base).unwrap_or_else(|_| base.to_path_buf());

    LINK_RE
        .replace_all(line, |caps: &regex::Captures| {
            let absolute = normalize(&base.join(&caps[2]));
            format!("[{}]({})", &caps[1], absolute.to_string_lossy())
        })
        .replace('\\', "/")
}

/// Lexically resolve `.` and `..` components without touching the disk.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
