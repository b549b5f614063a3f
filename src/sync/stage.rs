//! Differential staging of a pending generation
//!
//! Compares the scratch build against the live generation and assembles
//! the pending slot without recopying unchanged bytes: unchanged units
//! are hard-linked from live, changed and added units from the scratch
//! build, and units absent from the build are pruned. The staged tree is
//! assembled under a temp name and renamed into the pending slot only
//! once complete, so a half-staged pending is never observable.

use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::info;
use walkdir::WalkDir;

use super::diff::{diff_trees, Identity, TreeDiff, TreeEntry};
use crate::error::{FolioError, Result};
use crate::index::types::{MANIFEST_FILE, UNIT_TREES};
use crate::rotate::SlotPaths;

/// Machine-parsable record of what one staging pass synchronized
#[derive(Clone, Debug)]
pub struct SyncReport {
    /// Changed/added files under the unit trees (`lazy/`, `spellDict/`),
    /// in path order; the transcript a caller checks for differential
    /// minimality
    pub units: Vec<String>,
    /// Changed/added primary-structure files at the generation root
    pub primary: usize,
    /// Files shared with the live generation instead of copied
    pub unchanged: usize,
    /// Files present in live but absent from the new build
    pub pruned: Vec<String>,
}

/// Whether a relative path belongs to one of the unit trees
pub fn is_unit_path(rel: &str) -> bool {
    UNIT_TREES
        .iter()
        .any(|tree| rel.len() > tree.len() && rel.starts_with(tree) && rel.as_bytes()[tree.len()] == b'/')
}

/// List every file under `root` with its content identity, sorted by
/// relative path
pub fn scan_tree(root: &Path) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| FolioError::Sync(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| FolioError::Sync(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push(TreeEntry {
            rel,
            identity: file_identity(entry.path())?,
        });
    }
    entries.sort_by(|a, b| a.rel.cmp(&b.rel));
    Ok(entries)
}

fn file_identity(path: &Path) -> Result<Identity> {
    let mut file = fs::File::open(path).map_err(|e| sync_err(path, e))?;
    let mut hasher = crc32fast::Hasher::new();
    let mut len = 0u64;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| sync_err(path, e))?;
        if n == 0 {
            break;
        }
        len += n as u64;
        hasher.update(&buf[..n]);
    }
    Ok(Identity {
        len,
        crc: hasher.finalize(),
    })
}

/// Stage the scratch build against live into the pending slot.
///
/// Returns `None` without staging when a previously staged generation is
/// still pending, or when the build is identical to live (in which case
/// the scratch is simply consumed). On success the scratch slot is gone
/// and the pending slot holds a complete generation; on failure the
/// pending slot does not exist and the scratch is left for inspection.
pub fn stage(slots: &SlotPaths) -> Result<Option<SyncReport>> {
    let new_dir = slots.new_dir();
    if !new_dir.join(MANIFEST_FILE).exists() {
        return Err(FolioError::Sync(format!(
            "scratch slot '{}' does not hold a completed build",
            new_dir.display()
        )));
    }
    if slots.pending_dir().exists() {
        info!("a previous generation is still pending, not staging");
        return Ok(None);
    }

    let live_dir = slots.live_dir();
    let new_list = scan_tree(&new_dir)?;
    let live_list = if live_dir.exists() {
        scan_tree(&live_dir)?
    } else {
        Vec::new()
    };
    let diff = diff_trees(&new_list, &live_list);

    if live_dir.exists() && diff.is_empty() {
        info!("nothing has changed, not staging");
        fs::remove_dir_all(&new_dir).map_err(|e| sync_err(&new_dir, e))?;
        return Ok(None);
    }

    let tmp = slots.pending_tmp_dir();
    if tmp.exists() {
        fs::remove_dir_all(&tmp).map_err(|e| sync_err(&tmp, e))?;
    }
    if let Err(e) = assemble(&tmp, &new_dir, &live_dir, &diff) {
        // Never leave a half-staged pending tree behind
        let _ = fs::remove_dir_all(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, slots.pending_dir()).map_err(|e| {
        let _ = fs::remove_dir_all(&tmp);
        sync_err(&slots.pending_dir(), e)
    })?;
    // Scratch is consumed by a successful stage
    fs::remove_dir_all(&new_dir).map_err(|e| sync_err(&new_dir, e))?;

    let synced = diff.to_sync();
    let (units, primary): (Vec<String>, Vec<String>) =
        synced.into_iter().partition(|rel| is_unit_path(rel));
    for rel in &units {
        info!("synced {}", rel);
    }
    info!(
        units = units.len(),
        primary = primary.len(),
        unchanged = diff.unchanged.len(),
        pruned = diff.removed.len(),
        "staged pending generation"
    );

    Ok(Some(SyncReport {
        units,
        primary: primary.len(),
        unchanged: diff.unchanged.len(),
        pruned: diff.removed.clone(),
    }))
}

/// Build the staged tree: changed/added from the new build, unchanged
/// shared with live. Removed paths are simply not created.
fn assemble(tmp: &Path, new_dir: &Path, live_dir: &Path, diff: &TreeDiff) -> Result<()> {
    fs::create_dir_all(tmp).map_err(|e| sync_err(tmp, e))?;
    for rel in diff.added.iter().chain(diff.updated.iter()) {
        link_into(new_dir, rel, tmp)?;
    }
    for rel in &diff.unchanged {
        link_into(live_dir, rel, tmp)?;
    }
    Ok(())
}

fn link_into(src_root: &Path, rel: &str, dst_root: &Path) -> Result<()> {
    let src = src_root.join(rel);
    let dst = dst_root.join(rel);
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| sync_err(parent, e))?;
    }
    if fs::hard_link(&src, &dst).is_err() {
        fs::copy(&src, &dst).map_err(|e| sync_err(&src, e))?;
    }
    Ok(())
}

fn sync_err(path: &Path, e: std::io::Error) -> FolioError {
    FolioError::Sync(format!("{}: {}", path.display(), e))
}
