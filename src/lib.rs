//! DocScript: combine Markdown notes from a vault (or a collaborative bank)
//! into one document and render it with pandoc.

pub mod bank;
pub mod config;
pub mod error;
pub mod markdown;
pub mod paths;
pub mod render;
pub mod scaffold;
pub mod vault;
pub mod workflow;

pub use error::{Error, Result};
