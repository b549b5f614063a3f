//! Rotation manager
//!
//! Owns the generation lifecycle Building -> Pending -> Live -> Spare.
//! All writer-side transitions run under one mutex; the reader side is a
//! single lock-free pointer load. Promotion touches no file contents --
//! it is two directory renames plus a pointer swap, so a reader that
//! resolved the old generation keeps it until its request completes.

use std::fs;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::slots::SlotPaths;
use crate::config::RetentionPolicy;
use crate::error::{FolioError, Result};
use crate::index::manifest::GenerationManifest;
use crate::index::types::MANIFEST_FILE;
use crate::index::Generation;
use crate::sync::{stage, SyncReport};

/// Process-wide pointer to the generation currently served to queries.
///
/// Starts empty; superseded generations are released when the last
/// in-flight reader drops its `Arc`.
pub struct GenerationPointer {
    inner: ArcSwap<Option<Arc<Generation>>>,
}

impl GenerationPointer {
    pub fn empty() -> Self {
        Self {
            inner: ArcSwap::from_pointee(None),
        }
    }

    /// One atomic load; this is the only coordination on the read path
    pub fn load(&self) -> Option<Arc<Generation>> {
        let guard = self.inner.load();
        (**guard).clone()
    }

    pub fn store(&self, gen: Arc<Generation>) {
        self.inner.store(Arc::new(Some(gen)));
    }
}

impl Default for GenerationPointer {
    fn default() -> Self {
        Self::empty()
    }
}

pub struct Rotator {
    slots: SlotPaths,
    retention: RetentionPolicy,
    /// Serializes build/stage/promote; readers never take it
    writer: Mutex<()>,
    current: GenerationPointer,
}

impl Rotator {
    pub fn new(slots: SlotPaths, retention: RetentionPolicy) -> Self {
        Self {
            slots,
            retention,
            writer: Mutex::new(()),
            current: GenerationPointer::empty(),
        }
    }

    pub fn slots(&self) -> &SlotPaths {
        &self.slots
    }

    /// Stage the scratch build against live into the pending slot
    /// (differential sync). See [`crate::sync::stage`].
    pub fn stage(&self) -> Result<Option<SyncReport>> {
        let _writer = self.writer.lock();
        stage(&self.slots)
    }

    /// The generation currently serving queries. Opens the live slot on
    /// first use; returns `None` when no generation has been published.
    pub fn current(&self) -> Option<Arc<Generation>> {
        if let Some(gen) = self.current.load() {
            return Some(gen);
        }
        let _writer = self.writer.lock();
        if let Some(gen) = self.current.load() {
            return Some(gen);
        }
        if !self.slots.live_dir().exists() {
            return None;
        }
        match Generation::open(&self.slots.live_dir(), Some(&self.slots.spare_dir())) {
            Ok(gen) => {
                let gen = Arc::new(gen);
                self.current.store(gen.clone());
                Some(gen)
            }
            Err(e) => {
                warn!("cannot open live generation: {}", e);
                None
            }
        }
    }

    /// Promote a staged generation: the previously live one becomes the
    /// spare, the pending one becomes live, and the in-process pointer is
    /// swapped to it. Returns `false` when nothing is pending.
    ///
    /// A failed promotion leaves pending staged and live serving (the
    /// demotion is rolled back), so it is safe to retry.
    pub fn promote_if_pending(&self) -> Result<bool> {
        if !self.slots.pending_dir().exists() {
            return Ok(false);
        }
        let _writer = self.writer.lock();

        let pending = self.slots.pending_dir();
        if !pending.exists() {
            return Ok(false);
        }
        let live = self.slots.live_dir();
        let spare = self.slots.spare_dir();

        let mut demoted = false;
        if live.exists() {
            if spare.exists() {
                self.retire_spare()?;
            }
            fs::rename(&live, &spare).map_err(|e| {
                FolioError::Rotation(format!("cannot demote live generation: {}", e))
            })?;
            demoted = true;
        }
        if let Err(e) = fs::rename(&pending, &live) {
            if demoted {
                // Put the live generation back; pending stays staged
                let _ = fs::rename(&spare, &live);
            }
            return Err(FolioError::Rotation(format!(
                "cannot promote pending generation: {}",
                e
            )));
        }

        let gen = Arc::new(Generation::open(&live, Some(&spare))?);
        info!(
            generation = gen.generation(),
            docs = gen.doc_count(),
            "rotated: pending -> live, live -> spare"
        );
        self.current.store(gen);
        Ok(true)
    }

    /// Promote anything pending and make sure the pointer is populated
    pub fn refresh(&self) -> Result<bool> {
        let promoted = self.promote_if_pending()?;
        if !promoted {
            self.current();
        }
        Ok(promoted)
    }

    /// Apply the retention policy to the spare that is about to be
    /// replaced. Caller holds the writer lock.
    fn retire_spare(&self) -> Result<()> {
        let spare = self.slots.spare_dir();
        match self.retention {
            RetentionPolicy::KeepLatest => {
                fs::remove_dir_all(&spare).map_err(|e| {
                    FolioError::Rotation(format!("cannot retire spare generation: {}", e))
                })?;
            }
            RetentionPolicy::KeepAll => {
                let generation = fs::read(spare.join(MANIFEST_FILE))
                    .ok()
                    .and_then(|bytes| GenerationManifest::from_json(&bytes).ok())
                    .map(|m| m.generation)
                    .unwrap_or(0);
                let mut target = self.slots.retired_spare_dir(generation);
                let mut n = 0;
                while target.exists() {
                    n += 1;
                    target = self
                        .slots
                        .root()
                        .join(format!("index-spare.{}.{}", generation, n));
                }
                fs::rename(&spare, &target).map_err(|e| {
                    FolioError::Rotation(format!("cannot retire spare generation: {}", e))
                })?;
            }
        }
        Ok(())
    }
}
