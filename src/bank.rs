//! Collaborative banks: several collaborators' vaults behind one index.

pub mod aggregate;
pub mod assets;
pub mod registry;

pub use aggregate::{BankedNotes, build_bank_index, resolve_banked_notes, update_bank};
pub use assets::{copy_tree, merge_assets};
pub use registry::{Collaborator, Registry};
