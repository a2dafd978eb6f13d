//! Leading YAML front matter blocks.
//!
//! A block exists when the text (ignoring leading whitespace) starts with
//! `---` and a later line is exactly `---` or `...`. The block is kept
//! verbatim, delimiters included.

/// Locate the leading YAML block of a document, closing line included.
pub fn find_yaml_block(content: &str) -> Option<&str> {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return None;
    }

    let mut offset = 0;
    for (index, line) in trimmed.split_inclusive('\n').enumerate() {
        offset += line.len();
        if index == 0 {
            continue;
        }
        let bare = line.trim_end_matches(['\n', '\r']);
        if bare == "---" || bare == "..." {
            return Some(&trimmed[..offset]);
        }
    }

    None
}

/// Drop a leading YAML block, returning the remaining text left-trimmed.
pub fn strip_yaml_block(content: &str) -> &str {
    match find_yaml_block(content) {
        Some(block) => content.trim_start()[block.len()..].trim_start(),
        None => content,
    }
}

/// Put `block` at the top of `content`, replacing any block already there.
///
/// Two blank lines separate the block from the body. Applying the same block twice gives the same text as applying it once.
pub fn prepend_yaml_block(block: &str, content: &str) -> String {
    let body = strip_yaml_block(content);
    let mut out = String::with_capacity(block.len() + body.len() + 3);
    out.push_str(block);
    if !block.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("\n\n");
    out.push_str(body);
    out
}
