//! Spelling-correction dictionary
//!
//! The dictionary is a single auxiliary artifact, `spellDict/edmap.dat`,
//! derived from the whole corpus: every surface word is filed under a set
//! of sampled-character keys, and a misspelling is corrected by probing
//! the same keys and ranking the candidates by edit distance, then
//! frequency. The file is sorted text so a given corpus state always
//! produces identical bytes.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{FolioError, Result};
use crate::index::types::{SPELL_FILE, SPELL_TREE};

/// Sampling patterns: 4 of the first 6 character positions. A word and a
/// nearby misspelling share at least one pattern's key, which keeps each
/// candidate list small without scanning the whole word list.
const COMBOS: [[usize; 4]; 15] = [
    [0, 1, 2, 3],
    [0, 1, 2, 4],
    [0, 1, 2, 5],
    [0, 1, 3, 4],
    [0, 1, 3, 5],
    [0, 1, 4, 5],
    [0, 2, 3, 4],
    [0, 2, 3, 5],
    [0, 2, 4, 5],
    [0, 3, 4, 5],
    [1, 2, 3, 4],
    [1, 2, 3, 5],
    [1, 2, 4, 5],
    [1, 3, 4, 5],
    [2, 3, 4, 5],
];

/// Keys a word is filed under
fn edit_keys(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut keys = Vec::new();
    for combo in COMBOS.iter() {
        let key: String = combo
            .iter()
            .filter(|&&p| p < chars.len())
            .map(|&p| chars[p])
            .collect();
        if key.len() >= 2 && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Classic Levenshtein distance over characters
fn edit_distance(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<u32> = (0..=b.len() as u32).collect();
    let mut cur = vec![0u32; b.len() + 1];
    for i in 1..=a.len() {
        cur[0] = i as u32;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Accumulates word frequencies and writes the dictionary artifact
pub struct SpellDictBuilder {
    freqs: BTreeMap<String, u32>,
}

impl SpellDictBuilder {
    pub fn new() -> Self {
        Self {
            freqs: BTreeMap::new(),
        }
    }

    /// Count occurrences of a surface word
    pub fn add_word(&mut self, word: &str, count: u32) {
        if word.chars().count() < 2 {
            return;
        }
        *self.freqs.entry(word.to_string()).or_insert(0) += count;
    }

    pub fn word_count(&self) -> usize {
        self.freqs.len()
    }

    /// Render the dictionary file: one sorted line per key,
    /// `key|word|freq|word|freq|...` with words sorted within the line.
    fn render(&self) -> String {
        let mut keyed: BTreeMap<String, Vec<(&String, u32)>> = BTreeMap::new();
        for (word, freq) in &self.freqs {
            for key in edit_keys(word) {
                keyed.entry(key).or_default().push((word, *freq));
            }
        }

        let mut out = String::new();
        for (key, mut words) in keyed {
            words.sort_by(|a, b| a.0.cmp(b.0));
            out.push_str(&key);
            for (word, freq) in words {
                out.push('|');
                out.push_str(word);
                out.push('|');
                out.push_str(&freq.to_string());
            }
            out.push('\n');
        }
        out
    }

    /// Write `spellDict/edmap.dat` below the generation root (temp write
    /// and rename, like every other generation artifact)
    pub fn write(&self, gen_root: &Path) -> Result<()> {
        let dir = gen_root.join(SPELL_TREE);
        fs::create_dir_all(&dir)?;
        let path = dir.join(SPELL_FILE);
        let tmp = dir.join(format!("{}.tmp", SPELL_FILE));
        fs::write(&tmp, self.render())?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl Default for SpellDictBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Loaded spelling dictionary
pub struct SpellDict {
    keyed: HashMap<String, Vec<(String, u32)>>,
    words: HashMap<String, u32>,
}

impl SpellDict {
    /// Load the dictionary from a generation root; absent file yields an
    /// empty dictionary (spellcheck disabled at build time).
    pub fn load(gen_root: &Path) -> Result<Self> {
        let path = gen_root.join(SPELL_TREE).join(SPELL_FILE);
        if !path.exists() {
            return Ok(Self {
                keyed: HashMap::new(),
                words: HashMap::new(),
            });
        }
        let data = fs::read_to_string(&path)?;
        let mut keyed: HashMap<String, Vec<(String, u32)>> = HashMap::new();
        let mut words = HashMap::new();
        for (lineno, line) in data.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split('|');
            let key = fields
                .next()
                .ok_or_else(|| bad_line(lineno))?
                .to_string();
            let mut list = Vec::new();
            loop {
                let word = match fields.next() {
                    Some(w) => w.to_string(),
                    None => break,
                };
                let freq: u32 = fields
                    .next()
                    .ok_or_else(|| bad_line(lineno))?
                    .parse()
                    .map_err(|_| bad_line(lineno))?;
                words.insert(word.clone(), freq);
                list.push((word, freq));
            }
            keyed.insert(key, list);
        }
        Ok(Self { keyed, words })
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    /// Best correction for a word not in the dictionary, if any candidate
    /// is within edit distance 2. Ties break on higher frequency, then
    /// alphabetically.
    pub fn suggest(&self, word: &str) -> Option<String> {
        if self.contains(word) {
            return None;
        }
        let mut best: Option<(u32, u32, &String)> = None;
        for key in edit_keys(word) {
            if let Some(candidates) = self.keyed.get(&key) {
                for (cand, freq) in candidates {
                    let dist = edit_distance(word, cand);
                    if dist == 0 || dist > 2 {
                        continue;
                    }
                    let better = match &best {
                        None => true,
                        Some((bd, bf, bw)) => {
                            (dist, std::cmp::Reverse(*freq), cand)
                                < (*bd, std::cmp::Reverse(*bf), *bw)
                        }
                    };
                    if better {
                        best = Some((dist, *freq, cand));
                    }
                }
            }
        }
        best.map(|(_, _, w)| w.clone())
    }
}

fn bad_line(lineno: usize) -> FolioError {
    FolioError::Corrupt(format!("spell dictionary: malformed line {}", lineno + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("africa", "africa"), 0);
        assert_eq!(edit_distance("africa", "afrika"), 1);
        assert_eq!(edit_distance("africa", "america"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn test_edit_keys_share_for_typos() {
        let word_keys = edit_keys("antarctica");
        let typo_keys = edit_keys("antartica");
        assert!(word_keys.iter().any(|k| typo_keys.contains(k)));
    }

    #[test]
    fn test_suggest_nearby_word() {
        let tmp = TempDir::new().unwrap();
        let mut builder = SpellDictBuilder::new();
        builder.add_word("africa", 3);
        builder.add_word("america", 2);
        builder.write(tmp.path()).unwrap();

        let dict = SpellDict::load(tmp.path()).unwrap();
        assert!(dict.contains("africa"));
        assert_eq!(dict.suggest("afrika"), Some("africa".to_string()));
        // A known word needs no correction
        assert_eq!(dict.suggest("africa"), None);
        // Nothing within distance 2
        assert_eq!(dict.suggest("zzzzzzz"), None);
    }

    #[test]
    fn test_deterministic_bytes() {
        let render = || {
            let mut b = SpellDictBuilder::new();
            b.add_word("africa", 1);
            b.add_word("options", 2);
            b.add_word("south", 1);
            b.render()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn test_changed_words_change_bytes() {
        let mut v2 = SpellDictBuilder::new();
        v2.add_word("america", 1);
        let mut v3 = SpellDictBuilder::new();
        v3.add_word("antarctica", 1);
        assert_ne!(v2.render(), v3.render());
    }

    #[test]
    fn test_missing_file_is_empty_dict() {
        let tmp = TempDir::new().unwrap();
        let dict = SpellDict::load(tmp.path()).unwrap();
        assert!(dict.is_empty());
        assert_eq!(dict.suggest("anything"), None);
    }
}
