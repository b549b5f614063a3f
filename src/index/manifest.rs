//! Generation manifest
//!
//! The manifest records which documents a generation was built from and
//! the content identity of each, so that the next incremental build can
//! decide what to reprocess without touching the corpus more than once.
//! It is JSON on disk for operator inspection; entries are kept sorted by
//! document ID so the bytes are deterministic for a given corpus state.

use serde::{Deserialize, Serialize};

use super::types::{DocId, DocOrd, GenId};
use crate::error::{FolioError, Result};

/// Per-document entry in the manifest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    pub id: DocId,
    /// CRC32 of the document content at index time
    pub crc: u32,
    /// Content length in bytes
    pub len: u64,
    /// Number of indexed tokens
    pub tokens: u32,
    /// Path of the document's lazy unit, relative to the generation root
    pub lazy_path: String,
}

/// The manifest of one complete index generation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationManifest {
    /// Manifest format version
    pub version: u32,
    /// Generation number; advances only when the indexed content changes
    pub generation: GenId,
    pub index_name: String,
    /// Document table, sorted by ID; a document's ordinal is its index here
    pub docs: Vec<DocEntry>,
}

impl GenerationManifest {
    pub const VERSION: u32 = 1;

    pub fn new(index_name: &str, generation: GenId, mut docs: Vec<DocEntry>) -> Self {
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            version: Self::VERSION,
            generation,
            index_name: index_name.to_string(),
            docs,
        }
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    /// Look up a document's ordinal by ID
    pub fn ordinal(&self, id: &str) -> Option<DocOrd> {
        self.docs
            .binary_search_by(|e| e.id.as_str().cmp(id))
            .ok()
            .map(|i| i as DocOrd)
    }

    pub fn entry(&self, ord: DocOrd) -> Option<&DocEntry> {
        self.docs.get(ord as usize)
    }

    pub fn entry_by_id(&self, id: &str) -> Option<&DocEntry> {
        self.ordinal(id).and_then(|ord| self.entry(ord))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| FolioError::Corrupt(format!("manifest: {}", e)))
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        let manifest: Self = serde_json::from_slice(data)
            .map_err(|e| FolioError::Corrupt(format!("manifest: {}", e)))?;
        if manifest.version != Self::VERSION {
            return Err(FolioError::Corrupt(format!(
                "manifest format version {} (expected {})",
                manifest.version,
                Self::VERSION
            )));
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, crc: u32) -> DocEntry {
        DocEntry {
            id: id.to_string(),
            crc,
            len: 10,
            tokens: 3,
            lazy_path: format!("lazy/default/{}.lazy", id),
        }
    }

    #[test]
    fn test_docs_sorted_and_ordinals() {
        let manifest = GenerationManifest::new(
            "default",
            1,
            vec![entry("b.txt", 2), entry("a.txt", 1), entry("c.txt", 3)],
        );

        assert_eq!(manifest.doc_count(), 3);
        assert_eq!(manifest.ordinal("a.txt"), Some(0));
        assert_eq!(manifest.ordinal("b.txt"), Some(1));
        assert_eq!(manifest.ordinal("c.txt"), Some(2));
        assert_eq!(manifest.ordinal("missing.txt"), None);
        assert_eq!(manifest.entry_by_id("b.txt").unwrap().crc, 2);
    }

    #[test]
    fn test_json_round_trip() {
        let manifest = GenerationManifest::new("default", 7, vec![entry("doc1.txt", 42)]);
        let json = manifest.to_json().unwrap();
        let restored = GenerationManifest::from_json(&json).unwrap();
        assert_eq!(restored, manifest);
    }

    #[test]
    fn test_json_deterministic() {
        let build = || {
            GenerationManifest::new("default", 3, vec![entry("b.txt", 2), entry("a.txt", 1)])
                .to_json()
                .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_version_check() {
        let mut manifest = GenerationManifest::new("default", 1, vec![]);
        manifest.version = 99;
        let json = serde_json::to_vec(&manifest).unwrap();
        assert!(matches!(
            GenerationManifest::from_json(&json),
            Err(FolioError::Corrupt(_))
        ));
    }
}
