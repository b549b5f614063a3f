//! Persists a generation's primary structure
//!
//! The primary structure is two root-level files: the FST term dictionary
//! and the ordinal-ordered postings table. Both are written temp-then-
//! rename and are byte-deterministic for a given logical content.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::manifest::GenerationManifest;
use super::postings::encode_postings;
use super::term_dict::TermDictionaryBuilder;
use super::types::{PostingList, MANIFEST_FILE, POSTINGS_FILE, TERMS_FILE};
use crate::error::Result;

/// Write `terms.fst` and `postings.bin` from term -> postings, assigning
/// posting-list ordinals in lexicographic term order.
pub fn write_primary(gen_root: &Path, postings: &BTreeMap<String, PostingList>) -> Result<()> {
    let mut term_builder = TermDictionaryBuilder::with_capacity(postings.len());
    let mut lists = Vec::with_capacity(postings.len());
    for (ordinal, (term, list)) in postings.iter().enumerate() {
        term_builder.add(term.clone(), ordinal as u64);
        lists.push(list.clone());
    }
    let dict = term_builder.build()?;

    write_file(gen_root, TERMS_FILE, dict.as_bytes())?;
    write_file(gen_root, POSTINGS_FILE, &encode_postings(&lists)?)?;
    Ok(())
}

/// Write `generation.json`
pub fn write_manifest(gen_root: &Path, manifest: &GenerationManifest) -> Result<()> {
    write_file(gen_root, MANIFEST_FILE, &manifest.to_json()?)
}

fn write_file(gen_root: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(gen_root)?;
    let path = gen_root.join(name);
    let tmp = gen_root.join(format!("{}.tmp", name));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, &path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Posting;
    use tempfile::TempDir;

    #[test]
    fn test_write_primary_files_exist() {
        let tmp = TempDir::new().unwrap();
        let mut postings = BTreeMap::new();
        postings.insert(
            "africa".to_string(),
            PostingList {
                postings: vec![Posting {
                    doc: 0,
                    tf: 1,
                    positions: vec![5],
                }],
            },
        );

        write_primary(tmp.path(), &postings).unwrap();

        assert!(tmp.path().join(TERMS_FILE).exists());
        assert!(tmp.path().join(POSTINGS_FILE).exists());
        assert!(!tmp.path().join(format!("{}.tmp", TERMS_FILE)).exists());
    }
}
