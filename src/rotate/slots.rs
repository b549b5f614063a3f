//! The four rotation slots
//!
//! A generation's storage directory occupies exactly one role at a time:
//! `index-new` (scratch build), `index-pending` (staged, not yet served),
//! `index` (live), `index-spare` (most recently superseded). Promotion is
//! a pair of directory renames, so the slot-to-role mapping itself is the
//! atomically swapped pointer; file contents are never touched.

use std::path::{Path, PathBuf};

const LIVE: &str = "index";
const PENDING: &str = "index-pending";
const SPARE: &str = "index-spare";
const NEW: &str = "index-new";

/// Paths of the rotation slots under one index root
#[derive(Clone, Debug)]
pub struct SlotPaths {
    root: PathBuf,
}

impl SlotPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The generation currently served to queries
    pub fn live_dir(&self) -> PathBuf {
        self.root.join(LIVE)
    }

    /// A complete build staged for promotion
    pub fn pending_dir(&self) -> PathBuf {
        self.root.join(PENDING)
    }

    /// The most recently superseded live generation
    pub fn spare_dir(&self) -> PathBuf {
        self.root.join(SPARE)
    }

    /// Scratch area for a build in progress
    pub fn new_dir(&self) -> PathBuf {
        self.root.join(NEW)
    }

    /// Staging area used while assembling a pending generation; renamed to
    /// the pending slot only once complete
    pub fn pending_tmp_dir(&self) -> PathBuf {
        self.root.join(format!("{}.tmp", PENDING))
    }

    /// Resting place for an old spare under `RetentionPolicy::KeepAll`
    pub fn retired_spare_dir(&self, generation: u64) -> PathBuf {
        self.root.join(format!("{}.{}", SPARE, generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_layout() {
        let slots = SlotPaths::new("/srv/idx");
        assert_eq!(slots.live_dir(), PathBuf::from("/srv/idx/index"));
        assert_eq!(slots.pending_dir(), PathBuf::from("/srv/idx/index-pending"));
        assert_eq!(slots.spare_dir(), PathBuf::from("/srv/idx/index-spare"));
        assert_eq!(slots.new_dir(), PathBuf::from("/srv/idx/index-new"));
        assert_eq!(
            slots.pending_tmp_dir(),
            PathBuf::from("/srv/idx/index-pending.tmp")
        );
        assert_eq!(
            slots.retired_spare_dir(4),
            PathBuf::from("/srv/idx/index-spare.4")
        );
    }
}
