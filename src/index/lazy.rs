//! Per-document lazy units
//!
//! A lazy unit is the derived artifact computed for one document at index
//! time and read back at query/render time: the document text plus its
//! token table, so highlighting never re-parses the source. Units are
//! immutable once written: an edit produces a whole new file via a temp
//! write and rename, never an in-place mutation. Other generations that
//! hard-link the same unit therefore keep their bytes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{DocId, TokenSpan, LAZY_TREE};
use crate::error::{FolioError, Result};

const LAZY_VERSION: u32 = 1;

/// The stored form of one document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LazyUnit {
    pub doc_id: DocId,
    /// CRC32 of the source content this unit was computed from
    pub content_crc: u32,
    pub text: String,
    /// Token table in document order
    pub tokens: Vec<TokenSpan>,
}

#[derive(Serialize, Deserialize)]
struct LazyFile {
    version: u32,
    unit: LazyUnit,
}

/// Relative path of a document's lazy unit within a generation
pub fn lazy_rel_path(index_name: &str, doc_id: &str) -> String {
    format!("{}/{}/{}.lazy", LAZY_TREE, index_name, doc_id)
}

/// Write a lazy unit below `gen_root`, creating parent directories.
///
/// The unit is written to a temp name and renamed into place, so a
/// partially written file is never observed under the final name.
pub fn write_lazy(gen_root: &Path, rel_path: &str, unit: &LazyUnit) -> Result<()> {
    let path = gen_root.join(rel_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("lazy.tmp");
    let bytes = bincode::serialize(&LazyFile {
        version: LAZY_VERSION,
        unit: unit.clone(),
    })?;
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, &path)?;
    Ok(())
}

/// Read a lazy unit from below `gen_root`
pub fn read_lazy(gen_root: &Path, rel_path: &str) -> Result<LazyUnit> {
    let bytes = fs::read(gen_root.join(rel_path))?;
    let file: LazyFile = bincode::deserialize(&bytes)?;
    if file.version != LAZY_VERSION {
        return Err(FolioError::Corrupt(format!(
            "lazy unit format version {} (expected {})",
            file.version, LAZY_VERSION
        )));
    }
    Ok(file.unit)
}
