use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::TokenizerConfig;
use crate::index::TokenSpan;

/// Text tokenizer with stemming and stopword removal
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(LANGUAGE::English)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    /// Tokenize text into a vector of index terms
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenize_spans(text)
            .into_iter()
            .map(|span| span.term)
            .collect()
    }

    /// Tokenize text into index terms with positions and byte spans.
    ///
    /// Positions count every word including filtered ones, so phrase
    /// distances survive stopword removal. Byte spans point at the surface
    /// form in the original text; `term` is the normalized/stemmed form
    /// that goes into the index.
    pub fn tokenize_spans(&self, text: &str) -> Vec<TokenSpan> {
        let mut spans = Vec::new();
        let mut pos = 0u32;

        for (start, word) in text.unicode_word_indices() {
            let mut token = word.to_string();

            if self.config.lowercase {
                token = token.to_lowercase();
            }

            if token.len() < self.config.min_token_length
                || token.len() > self.config.max_token_length
                || self.stopwords.contains(&token)
            {
                pos += 1;
                continue;
            }

            if let Some(stemmer) = &self.stemmer {
                token = stemmer.stem(&token).to_string();
            }

            spans.push(TokenSpan {
                term: token,
                position: pos,
                start: start as u32,
                end: (start + word.len()) as u32,
            });
            pos += 1;
        }

        spans
    }

    /// Normalize a query string into distinct index terms, in query order
    pub fn query_terms(&self, query: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tokenize(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }
}
