//! Differential synchronization between index generations

mod diff;
mod stage;

pub use diff::{diff_trees, Identity, TreeDiff, TreeEntry};
pub use stage::{is_unit_path, scan_tree, stage, SyncReport};
