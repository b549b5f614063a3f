//! Read-only access to the source document corpus

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{FolioError, Result};
use crate::index::DocId;

/// One document discovered in the corpus
#[derive(Clone, Debug)]
pub struct CorpusDoc {
    pub id: DocId,
    pub path: PathBuf,
    pub len: u64,
}

/// A directory of source documents.
///
/// The corpus is owned externally; folio only reads it. Document IDs are
/// paths relative to the corpus root, so they stay stable across scans.
pub struct Corpus {
    root: PathBuf,
}

impl Corpus {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate all documents, sorted by ID
    pub fn scan(&self) -> Result<Vec<CorpusDoc>> {
        if !self.root.is_dir() {
            return Err(FolioError::Build(format!(
                "corpus directory '{}' does not exist or cannot be read",
                self.root.display()
            )));
        }

        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| FolioError::Build(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| FolioError::Build(e.to_string()))?;
            let id = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let len = entry
                .metadata()
                .map_err(|e| FolioError::Build(e.to_string()))?
                .len();
            docs.push(CorpusDoc {
                id,
                path: entry.path().to_path_buf(),
                len,
            });
        }
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    /// Read a document's full content.
    ///
    /// Any read failure is a build failure: the caller aborts the whole
    /// build rather than indexing a partial corpus.
    pub fn read(&self, doc: &CorpusDoc) -> Result<String> {
        fs::read_to_string(&doc.path).map_err(|e| {
            FolioError::Build(format!("cannot read document '{}': {}", doc.id, e))
        })
    }
}

/// CRC32 content identity used for change detection
pub fn content_crc(content: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(content.as_bytes());
    hasher.finalize()
}
