//! Path normalization for external tools.
//!
//! pandoc and latexmk cannot cope with Windows UNC shares (`\\server\share`)
//! or backslash paths coming from a mixed environment. Everything handed to
//! the toolchain goes through [`tool_path`]; nothing else in the crate
//! branches on the platform.

use std::path::Path;

/// Prefix Windows puts in front of extended-length paths.
const VERBATIM_PREFIX: &str = r"\\?\";

/// Turn a path into the string form the external toolchain should receive.
pub fn tool_path(path: &Path) -> String {
    let raw = path.to_string_lossy();

    if cfg!(windows) {
        let raw = raw.strip_prefix(VERBATIM_PREFIX).unwrap_or(&raw);
        if raw.starts_with(r"\\") {
            let drives = mapped_drives();
            return map_unc_to_drive(raw, &drives).unwrap_or_else(|| raw.to_string());
        }
        return raw.to_string();
    }

    to_posix(&raw)
}

/// Whether a build directory lives on a network share.
///
/// Network builds go through an intermediate `.tex` file because xelatex
/// invoked by pandoc cannot write next to a share.
pub fn is_network_path(path: &Path) -> bool {
    let raw = path.to_string_lossy();
    if raw.starts_with(r"\\") || raw.starts_with("//") {
        return true;
    }
    cfg!(windows) && !raw.to_ascii_uppercase().starts_with("C:")
}

/// Convert a Windows, UNC or drive-letter path to a POSIX path.
///
/// Relative and already-POSIX paths come back unchanged.
pub fn to_posix(raw: &str) -> String {
    let raw = raw.strip_prefix(VERBATIM_PREFIX).unwrap_or(raw);
    let slashed = raw.replace('\\', "/");

    if slashed.starts_with("//") {
        return format!("/{}", slashed.trim_start_matches('/'));
    }

    let bytes = slashed.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/' {
        let drive = (bytes[0] as char).to_ascii_lowercase();
        return format!("/{drive}{}", &slashed[2..]);
    }

    slashed
}

/// Parse the output of `net use` into `(drive, unc)` pairs.
pub fn parse_net_use(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let first = parts.next()?;
            let second = parts.next()?;
            // Status column is optional ("OK", "Disconnected", ...)
            let (drive, unc) = if first.ends_with(':') {
                (first, second)
            } else {
                (second, parts.next()?)
            };
            (drive.ends_with(':') && unc.starts_with(r"\\"))
                .then(|| (drive.to_string(), unc.to_string()))
        })
        .collect()
}

/// Rewrite a UNC path onto the drive letter its share is mapped to.
///
/// Longer share paths are tried first. The share's last folder is located in
/// the path and everything after it is re-rooted on the drive.
pub fn map_unc_to_drive(raw: &str, drives: &[(String, String)]) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let full_parts: Vec<&str> = normalized
        .trim_matches('/')
        .split('/')
        .filter(|part| !part.is_empty())
        .collect();

    let mut candidates: Vec<&(String, String)> = drives.iter().collect();
    candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    for (drive, unc) in candidates {
        let unc = unc.replace('\\', "/");
        let Some(share_leaf) = unc.trim_matches('/').split('/').next_back() else {
            continue;
        };
        if let Some(index) = full_parts.iter().position(|part| *part == share_leaf) {
            let rest = full_parts[index + 1..].join("/");
            return Some(format!("{drive}/{rest}"));
        }
    }

    None
}

#[cfg(windows)]
fn mapped_drives() -> Vec<(String, String)> {
    match std::process::Command::new("net").arg("use").output() {
        Ok(output) => parse_net_use(&String::from_utf8_lossy(&output.stdout)),
        Err(error) => {
            tracing::warn!(%error, "failed to list mapped network drives");
            Vec::new()
        }
    }
}

#[cfg(not(windows))]
fn mapped_drives() -> Vec<(String, String)> {
    Vec::new()
}
