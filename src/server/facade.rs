//! Query server facade
//!
//! Every request resolves the live-generation pointer exactly once and
//! then works off that immutable generation: search and view can never
//! observe a half-published index, and an in-progress build is invisible
//! until the rotation manager promotes it. The facade itself never
//! rotates; `refresh()` exists for the serving layer and the warmer to
//! call between requests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::snippet::{markup_document, snippet_lines};
use crate::config::IndexConfig;
use crate::error::{FolioError, Result};
use crate::index::{DocId, DocOrd, GenId, Generation};
use crate::rotate::{Rotator, SlotPaths};
use crate::tokenizer::Tokenizer;

/// One ranked search result
#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f32,
    /// Document lines containing hits, with `<span class="hit">` markup
    pub snippets: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
    /// Generation that answered the request
    pub generation: GenId,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
    /// Spelling suggestion when a query term matched nothing
    pub did_you_mean: Option<String>,
}

/// Full-document view with in-context hit markup
#[derive(Clone, Debug, Serialize)]
pub struct DocView {
    pub doc_id: DocId,
    pub generation: GenId,
    pub hit_count: u32,
    pub markup: String,
}

pub struct SearchServer {
    rotator: Arc<Rotator>,
    tokenizer: Tokenizer,
    max_snippets: usize,
}

impl SearchServer {
    pub fn new(config: &IndexConfig) -> Self {
        let rotator = Arc::new(Rotator::new(
            SlotPaths::new(&config.index_root),
            config.retention,
        ));
        Self::with_rotator(config, rotator)
    }

    /// Share a rotator with other components (e.g. a warmer)
    pub fn with_rotator(config: &IndexConfig, rotator: Arc<Rotator>) -> Self {
        Self {
            rotator,
            tokenizer: Tokenizer::new(&config.tokenizer),
            max_snippets: 3,
        }
    }

    pub fn rotator(&self) -> &Arc<Rotator> {
        &self.rotator
    }

    /// Promote a staged generation if one is pending. Called by the
    /// serving layer between requests, never from the query path.
    pub fn refresh(&self) -> Result<bool> {
        self.rotator.refresh()
    }

    fn resolve(&self) -> Result<Arc<Generation>> {
        self.rotator.current().ok_or_else(|| {
            FolioError::Query("no index generation has been published".to_string())
        })
    }

    /// Keyword search: tf·idf ranking with hit-highlighted snippet lines
    pub fn search(&self, query: &str, top_k: usize) -> Result<SearchResponse> {
        let spans = self.tokenizer.tokenize_spans(query);
        if spans.is_empty() {
            return Err(FolioError::Query(format!(
                "query '{}' contains no searchable terms",
                query
            )));
        }
        let gen = self.resolve()?;
        debug!(generation = gen.generation(), query, "search");

        let mut terms: Vec<&str> = Vec::new();
        let mut missing_surface: Option<String> = None;
        let mut scores: HashMap<DocOrd, f32> = HashMap::new();
        let doc_count = gen.doc_count().max(1) as f32;

        for span in &spans {
            if terms.contains(&span.term.as_str()) {
                continue;
            }
            terms.push(&span.term);
            match gen.postings(&span.term) {
                Some(list) => {
                    let idf = (1.0 + doc_count / list.doc_frequency() as f32).ln();
                    for posting in &list.postings {
                        *scores.entry(posting.doc).or_insert(0.0) += posting.tf as f32 * idf;
                    }
                }
                None => {
                    // Remember the surface form for the spelling suggestion
                    if missing_surface.is_none() {
                        missing_surface = Some(
                            query[span.start as usize..span.end as usize].to_lowercase(),
                        );
                    }
                }
            }
        }

        let total_hits = scores.len();
        let mut ranked: Vec<(DocOrd, f32)> = scores.into_iter().collect();
        // Ordinals ascend with document ID, so ties rank alphabetically
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(top_k);

        let term_set: HashSet<String> = terms.iter().map(|t| t.to_string()).collect();
        let mut results = Vec::with_capacity(ranked.len());
        for (ord, score) in ranked {
            let entry = match gen.manifest().entry(ord) {
                Some(entry) => entry,
                None => continue,
            };
            let unit = gen.lazy_unit(&entry.id)?;
            results.push(SearchHit {
                doc_id: entry.id.clone(),
                score,
                snippets: snippet_lines(&unit, &term_set, self.max_snippets),
            });
        }

        let did_you_mean = missing_surface.and_then(|word| gen.spell().suggest(&word));

        Ok(SearchResponse {
            generation: gen.generation(),
            total_hits,
            results,
            did_you_mean,
        })
    }

    /// Document view: the full text with every query hit wrapped and
    /// numbered in document order
    pub fn view(&self, doc_id: &str, query: &str) -> Result<DocView> {
        let terms = self.tokenizer.query_terms(query);
        if terms.is_empty() {
            return Err(FolioError::Query(format!(
                "query '{}' contains no searchable terms",
                query
            )));
        }
        let gen = self.resolve()?;
        debug!(generation = gen.generation(), doc = doc_id, query, "view");

        let unit = gen.lazy_unit(doc_id)?;
        let term_set: HashSet<String> = terms.into_iter().collect();
        let (markup, hit_count) = markup_document(&unit, &term_set);

        Ok(DocView {
            doc_id: doc_id.to_string(),
            generation: gen.generation(),
            hit_count,
            markup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use std::fs;
    use tempfile::TempDir;

    fn published_server(docs: &[(&str, &str)]) -> (TempDir, IndexConfig, SearchServer) {
        let tmp = TempDir::new().unwrap();
        let corpus_dir = tmp.path().join("data");
        let index_root = tmp.path().join("idx");
        fs::create_dir_all(&corpus_dir).unwrap();
        fs::create_dir_all(&index_root).unwrap();
        for (name, content) in docs {
            fs::write(corpus_dir.join(name), content).unwrap();
        }
        let config = IndexConfig::new(corpus_dir, index_root);
        let server = SearchServer::new(&config);
        IndexBuilder::new(config.clone())
            .build(server.rotator().slots())
            .unwrap();
        server.rotator().stage().unwrap().unwrap();
        server.refresh().unwrap();
        (tmp, config, server)
    }

    #[test]
    fn test_search_ranks_and_highlights() {
        let (_tmp, _config, server) = published_server(&[
            ("doc1.txt", "Africa Africa Africa\n"),
            ("doc2.txt", "Africa once, gardening mostly\n"),
            ("doc3.txt", "Nothing about that continent\n"),
        ]);

        let response = server.search("africa", 10).unwrap();
        assert_eq!(response.generation, 1);
        assert_eq!(response.total_hits, 2);
        assert_eq!(response.results[0].doc_id, "doc1.txt");
        assert_eq!(response.results[1].doc_id, "doc2.txt");
        assert!(response.results[0].snippets[0]
            .contains("<span class=\"hit\">Africa</span>"));
        assert!(response.did_you_mean.is_none());
    }

    #[test]
    fn test_search_suggests_for_misspelling() {
        let (_tmp, _config, server) =
            published_server(&[("doc1.txt", "The Global Relevance of South Africa\n")]);

        let response = server.search("afrika", 10).unwrap();
        assert_eq!(response.total_hits, 0);
        assert_eq!(response.did_you_mean, Some("africa".to_string()));
    }

    #[test]
    fn test_view_marks_hits() {
        let (_tmp, _config, server) =
            published_server(&[("doc1.txt", "The Global Relevance of South Africa\n")]);

        let view = server.view("doc1.txt", "africa").unwrap();
        assert_eq!(view.hit_count, 1);
        assert!(view
            .markup
            .contains("South <hit no=\"1\"><term>Africa</term></hit>"));
    }

    #[test]
    fn test_query_errors() {
        let (_tmp, _config, server) = published_server(&[("doc1.txt", "Some text\n")]);

        assert!(matches!(
            server.search("!!!", 10),
            Err(FolioError::Query(_))
        ));
        assert!(matches!(
            server.view("missing.txt", "text"),
            Err(FolioError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_search_without_published_generation() {
        let tmp = TempDir::new().unwrap();
        let corpus_dir = tmp.path().join("data");
        fs::create_dir_all(&corpus_dir).unwrap();
        let config = IndexConfig::new(corpus_dir, tmp.path().join("idx"));
        let server = SearchServer::new(&config);

        assert!(matches!(
            server.search("anything", 10),
            Err(FolioError::Query(_))
        ));
    }
}
