//! Core types shared across the index subsystem

use serde::{Deserialize, Serialize};

/// External document identifier: the document's path relative to the
/// corpus root, with `/` separators.
pub type DocId = String;

/// Ordinal of a document within one generation's manifest (index into
/// the sorted document table). Valid only within that generation.
pub type DocOrd = u32;

/// Generation number of one complete index build
pub type GenId = u64;

/// One document's occurrences of a single term
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc: DocOrd,
    /// Term frequency within the document
    pub tf: u32,
    /// Token positions, ascending
    pub positions: Vec<u32>,
}

/// All postings for one term, ordered by document ordinal
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingList {
    pub postings: Vec<Posting>,
}

impl PostingList {
    /// Number of documents containing the term
    pub fn doc_frequency(&self) -> u32 {
        self.postings.len() as u32
    }
}

/// One token produced at index time: the normalized term plus where its
/// surface form sits in the original text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub term: String,
    pub position: u32,
    /// Byte offset of the surface form in the document text
    pub start: u32,
    /// Byte offset one past the surface form
    pub end: u32,
}

/// File names within a generation directory
pub const MANIFEST_FILE: &str = "generation.json";
pub const TERMS_FILE: &str = "terms.fst";
pub const POSTINGS_FILE: &str = "postings.bin";

/// Subtree holding per-document lazy units: `lazy/<index_name>/`
pub const LAZY_TREE: &str = "lazy";
/// Subtree holding the spelling dictionary
pub const SPELL_TREE: &str = "spellDict";
/// The spelling dictionary artifact within [`SPELL_TREE`]
pub const SPELL_FILE: &str = "edmap.dat";

/// The subtrees whose files are tracked as individually synchronized
/// units; everything else in a generation is primary structure.
pub const UNIT_TREES: [&str; 2] = [LAZY_TREE, SPELL_TREE];
