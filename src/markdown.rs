//! Text-level Markdown helpers: link scanning and YAML front matter.

pub mod frontmatter;
pub mod links;

pub use frontmatter::{find_yaml_block, prepend_yaml_block};
pub use links::{absolutize_links, scan_links, scan_links_for_argument};
