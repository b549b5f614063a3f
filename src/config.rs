use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one named index
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index name; lazy units live under `lazy/<index_name>/`
    pub index_name: String,
    /// Directory containing the source documents
    pub corpus_dir: PathBuf,
    /// Directory under which the rotation slots are created
    pub index_root: PathBuf,
    /// Whether to build the spelling-correction dictionary
    pub spellcheck: bool,
    /// What happens to a superseded spare generation on promotion
    pub retention: RetentionPolicy,
    /// Background warmer interval in seconds (0 disables the warmer)
    pub warm_interval_secs: u64,
    pub tokenizer: TokenizerConfig,
}

impl IndexConfig {
    pub fn new<P: Into<PathBuf>>(corpus_dir: P, index_root: P) -> Self {
        Self {
            index_name: "default".to_string(),
            corpus_dir: corpus_dir.into(),
            index_root: index_root.into(),
            spellcheck: true,
            retention: RetentionPolicy::KeepLatest,
            warm_interval_secs: 0,
            tokenizer: TokenizerConfig::default(),
        }
    }

    pub fn with_index_name(mut self, name: &str) -> Self {
        self.index_name = name.to_string();
        self
    }

    pub fn with_spellcheck(mut self, enabled: bool) -> Self {
        self.spellcheck = enabled;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_warm_interval(mut self, secs: u64) -> Self {
        self.warm_interval_secs = secs;
        self
    }
}

/// Retirement policy for the spare slot when a new generation is promoted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetentionPolicy {
    /// Keep only the most recent spare; the one it replaces is deleted
    KeepLatest,
    /// Move the old spare aside as `index-spare.<generation>` instead of deleting
    KeepAll,
}

/// Tokenizer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: true,
            stem: true,
            min_token_length: 2,
            max_token_length: 50,
        }
    }
}
