//! FST-backed term dictionary
//!
//! Maps each term to the ordinal of its posting list. The FST gives
//! O(|term|) lookups and a compact, byte-deterministic on-disk form for
//! a given term set, which the differential sync relies on.

use fst::{Map, MapBuilder, Streamer};

use crate::error::{FolioError, Result};

/// Immutable term dictionary for one generation
pub struct TermDictionary {
    fst: Map<Vec<u8>>,
}

impl TermDictionary {
    /// Load a dictionary from raw FST bytes
    pub fn from_bytes(fst_data: Vec<u8>) -> Result<Self> {
        let fst = Map::new(fst_data)
            .map_err(|e| FolioError::Corrupt(format!("term dictionary: {}", e)))?;
        Ok(Self { fst })
    }

    /// Look up a term's posting-list ordinal
    pub fn get(&self, term: &str) -> Option<u64> {
        self.fst.get(term.as_bytes())
    }

    pub fn contains(&self, term: &str) -> bool {
        self.fst.contains_key(term.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.fst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fst.is_empty()
    }

    /// Iterate all terms with their ordinals, in lexicographic order
    pub fn iter_terms(&self) -> Vec<(String, u64)> {
        let mut results = Vec::with_capacity(self.fst.len());
        let mut stream = self.fst.stream();
        while let Some((key, ord)) = stream.next() {
            if let Ok(term) = std::str::from_utf8(key) {
                results.push((term.to_string(), ord));
            }
        }
        results
    }

    /// Raw FST bytes for persistence
    pub fn as_bytes(&self) -> &[u8] {
        self.fst.as_fst().as_bytes()
    }
}

/// Builds a term dictionary from (term, ordinal) pairs.
///
/// Terms are sorted internally; ordinals must be dense and correspond to
/// positions in the postings table written alongside.
pub struct TermDictionaryBuilder {
    terms: Vec<(String, u64)>,
}

impl TermDictionaryBuilder {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, term: String, ordinal: u64) {
        self.terms.push((term, ordinal));
    }

    pub fn build(mut self) -> Result<TermDictionary> {
        // FST construction requires sorted input
        self.terms.sort_by(|a, b| a.0.cmp(&b.0));

        let mut fst_builder = MapBuilder::memory();
        for (term, ordinal) in self.terms {
            fst_builder
                .insert(term.as_bytes(), ordinal)
                .map_err(|e| FolioError::Corrupt(format!("term dictionary: {}", e)))?;
        }
        let fst_data = fst_builder
            .into_inner()
            .map_err(|e| FolioError::Corrupt(format!("term dictionary: {}", e)))?;

        TermDictionary::from_bytes(fst_data)
    }
}

impl Default for TermDictionaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
