//! Immutable reader over one published generation
//!
//! `Generation::open` loads the manifest, term dictionary, postings and
//! spelling dictionary into memory; from then on the reader never takes a
//! lock and never observes later builds. Lazy units are read on demand
//! and verified against the manifest's content CRC. If a later promotion
//! has demoted this generation's directory to the spare slot, the
//! verification fails on the freshly promoted file and the read falls
//! back to the spare path, so a request that resolved this generation
//! keeps seeing exactly this generation's content.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::lazy::{read_lazy, LazyUnit};
use super::manifest::GenerationManifest;
use super::spell::SpellDict;
use super::term_dict::TermDictionary;
use super::types::{GenId, PostingList, MANIFEST_FILE, POSTINGS_FILE, TERMS_FILE};
use crate::error::{FolioError, Result};
use crate::index::postings::decode_postings;

pub struct Generation {
    dir: PathBuf,
    /// Where this generation's files end up if it is demoted
    fallback_dir: Option<PathBuf>,
    manifest: GenerationManifest,
    terms: TermDictionary,
    postings: Vec<PostingList>,
    spell: SpellDict,
}

impl Generation {
    /// Open the generation stored at `dir`. `fallback_dir` is the slot the
    /// directory would be renamed to when superseded (the spare slot for a
    /// live generation; `None` for scratch reads).
    pub fn open(dir: &Path, fallback_dir: Option<&Path>) -> Result<Self> {
        let manifest_bytes = fs::read(dir.join(MANIFEST_FILE)).map_err(|e| {
            FolioError::Corrupt(format!(
                "'{}' does not contain a complete generation: {}",
                dir.display(),
                e
            ))
        })?;
        let manifest = GenerationManifest::from_json(&manifest_bytes)?;
        let terms = TermDictionary::from_bytes(fs::read(dir.join(TERMS_FILE))?)?;
        let postings = decode_postings(&fs::read(dir.join(POSTINGS_FILE))?)?;
        if terms.len() != postings.len() {
            return Err(FolioError::Corrupt(format!(
                "term dictionary has {} terms but postings table has {} lists",
                terms.len(),
                postings.len()
            )));
        }
        let spell = SpellDict::load(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            fallback_dir: fallback_dir.map(|p| p.to_path_buf()),
            manifest,
            terms,
            postings,
            spell,
        })
    }

    pub fn manifest(&self) -> &GenerationManifest {
        &self.manifest
    }

    pub fn generation(&self) -> GenId {
        self.manifest.generation
    }

    pub fn doc_count(&self) -> usize {
        self.manifest.doc_count()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Postings for a term, if any document contains it
    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.terms
            .get(term)
            .and_then(|ord| self.postings.get(ord as usize))
    }

    /// All (term, postings) pairs in lexicographic term order
    pub fn iter_postings(&self) -> impl Iterator<Item = (String, &PostingList)> {
        self.terms
            .iter_terms()
            .into_iter()
            .map(|(term, ord)| (term, &self.postings[ord as usize]))
    }

    pub fn spell(&self) -> &SpellDict {
        &self.spell
    }

    /// Load a document's lazy unit, verifying it belongs to this
    /// generation. Falls back to the demoted location when a newer
    /// generation has taken over this directory.
    pub fn lazy_unit(&self, doc_id: &str) -> Result<LazyUnit> {
        let entry = self
            .manifest
            .entry_by_id(doc_id)
            .ok_or_else(|| FolioError::DocumentNotFound(doc_id.to_string()))?;

        match self.read_verified(&self.dir, &entry.lazy_path, entry.crc, doc_id) {
            Ok(unit) => Ok(unit),
            Err(primary_err) => {
                if let Some(fallback) = &self.fallback_dir {
                    debug!(
                        doc = doc_id,
                        fallback = %fallback.display(),
                        "lazy unit not at primary path, trying demoted location"
                    );
                    if let Ok(unit) =
                        self.read_verified(fallback, &entry.lazy_path, entry.crc, doc_id)
                    {
                        return Ok(unit);
                    }
                }
                Err(primary_err)
            }
        }
    }

    fn read_verified(
        &self,
        root: &Path,
        rel_path: &str,
        expected_crc: u32,
        doc_id: &str,
    ) -> Result<LazyUnit> {
        let unit = read_lazy(root, rel_path)?;
        if unit.doc_id != doc_id || unit.content_crc != expected_crc {
            return Err(FolioError::Corrupt(format!(
                "lazy unit '{}' does not match generation {} (crc {:08x}, expected {:08x})",
                rel_path, self.manifest.generation, unit.content_crc, expected_crc
            )));
        }
        Ok(unit)
    }
}
