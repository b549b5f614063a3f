//! Index builder
//!
//! Builds a complete, self-consistent generation into the scratch slot.
//! With a trusted prior generation (the live slot) the build is
//! incremental: unchanged documents keep their lazy units by hard link
//! and their postings by remap, and only edited documents are
//! re-tokenized. The spelling dictionary is always recomputed from the
//! full corpus state. The builder never writes outside the scratch slot.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::IndexConfig;
use crate::corpus::{content_crc, Corpus};
use crate::error::{FolioError, Result};
use crate::index::lazy::{lazy_rel_path, read_lazy, write_lazy, LazyUnit};
use crate::index::manifest::{DocEntry, GenerationManifest};
use crate::index::reader::Generation;
use crate::index::spell::SpellDictBuilder;
use crate::index::writer::{write_manifest, write_primary};
use crate::index::{DocOrd, GenId, Posting, PostingList, TokenSpan};
use crate::rotate::SlotPaths;
use crate::tokenizer::Tokenizer;

/// Outcome of one build
#[derive(Clone, Debug)]
pub struct BuildReport {
    /// Documents tokenized and written fresh
    pub indexed: usize,
    /// Documents carried forward from the prior generation
    pub carried: usize,
    /// Documents present in the prior generation but gone from the corpus
    pub removed: usize,
    /// Generation number of the build
    pub generation: GenId,
}

pub struct IndexBuilder {
    config: IndexConfig,
    tokenizer: Tokenizer,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig) -> Self {
        let tokenizer = Tokenizer::new(&config.tokenizer);
        Self { config, tokenizer }
    }

    /// Build a generation into the `new` slot. `clean` forces a full
    /// rebuild; otherwise the live generation (if present and readable)
    /// drives an incremental build.
    ///
    /// Fail-fast: the first unreadable document aborts the whole build.
    /// The live and spare slots are never touched; a failed build leaves
    /// its scratch in place for inspection.
    pub fn build(&self, slots: &SlotPaths) -> Result<BuildReport> {
        self.build_opts(slots, false)
    }

    pub fn build_opts(&self, slots: &SlotPaths, clean: bool) -> Result<BuildReport> {
        let corpus = Corpus::new(&self.config.corpus_dir);
        let docs = corpus.scan()?;

        // The live generation serves two purposes: carry-forward source for
        // incremental builds, and the baseline for generation numbering.
        let live = if slots.live_dir().exists() {
            match Generation::open(&slots.live_dir(), None) {
                Ok(gen) => Some(gen),
                Err(e) => {
                    warn!("live generation unreadable, falling back to full build: {}", e);
                    None
                }
            }
        } else {
            None
        };
        let prior = if clean { None } else { live.as_ref() };

        let scratch = slots.new_dir();
        if scratch.exists() {
            // Stale scratch from an aborted run is never trusted
            fs::remove_dir_all(&scratch)?;
        }
        fs::create_dir_all(&scratch)?;

        let mut entries: Vec<DocEntry> = Vec::with_capacity(docs.len());
        let mut fresh_tokens: HashMap<String, Vec<TokenSpan>> = HashMap::new();
        // prior ordinal -> new ordinal, for postings remap
        let mut carried_ords: HashMap<DocOrd, DocOrd> = HashMap::new();
        let mut indexed = 0usize;

        for (new_ord, doc) in docs.iter().enumerate() {
            let content = corpus.read(doc)?;
            let crc = content_crc(&content);
            let rel = lazy_rel_path(&self.config.index_name, &doc.id);

            let carried = prior.and_then(|prior_gen| {
                let prior_ord = prior_gen.manifest().ordinal(&doc.id)?;
                let prior_entry = prior_gen.manifest().entry(prior_ord)?;
                let unchanged =
                    prior_entry.crc == crc && prior_entry.len == content.len() as u64;
                unchanged.then_some((prior_ord, prior_entry))
            });
            if let Some((prior_ord, prior_entry)) = carried {
                link_or_copy(
                    &slots.live_dir().join(&prior_entry.lazy_path),
                    &scratch.join(&rel),
                )?;
                carried_ords.insert(prior_ord, new_ord as DocOrd);
                entries.push(DocEntry {
                    id: doc.id.clone(),
                    crc,
                    len: prior_entry.len,
                    tokens: prior_entry.tokens,
                    lazy_path: rel,
                });
                continue;
            }

            let spans = self.tokenizer.tokenize_spans(&content);
            write_lazy(
                &scratch,
                &rel,
                &LazyUnit {
                    doc_id: doc.id.clone(),
                    content_crc: crc,
                    text: content.clone(),
                    tokens: spans.clone(),
                },
            )?;
            entries.push(DocEntry {
                id: doc.id.clone(),
                crc,
                len: content.len() as u64,
                tokens: spans.len() as u32,
                lazy_path: rel,
            });
            fresh_tokens.insert(doc.id.clone(), spans);
            indexed += 1;
        }

        let removed = match prior {
            Some(prior_gen) => {
                let current: HashSet<&str> = docs.iter().map(|d| d.id.as_str()).collect();
                prior_gen
                    .manifest()
                    .docs
                    .iter()
                    .filter(|e| !current.contains(e.id.as_str()))
                    .count()
            }
            None => 0,
        };

        // Assemble postings: carried documents contribute through the prior
        // primary, fresh documents through their token tables.
        let mut postings: BTreeMap<String, PostingList> = BTreeMap::new();
        if let Some(prior_gen) = prior {
            if !carried_ords.is_empty() {
                for (term, list) in prior_gen.iter_postings() {
                    for posting in &list.postings {
                        if let Some(&new_ord) = carried_ords.get(&posting.doc) {
                            postings.entry(term.clone()).or_default().postings.push(
                                Posting {
                                    doc: new_ord,
                                    tf: posting.tf,
                                    positions: posting.positions.clone(),
                                },
                            );
                        }
                    }
                }
            }
        }
        for (ord, entry) in entries.iter().enumerate() {
            if let Some(spans) = fresh_tokens.get(&entry.id) {
                let mut per_term: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
                for span in spans {
                    per_term.entry(&span.term).or_default().push(span.position);
                }
                for (term, positions) in per_term {
                    postings.entry(term.to_string()).or_default().postings.push(
                        Posting {
                            doc: ord as DocOrd,
                            tf: positions.len() as u32,
                            positions,
                        },
                    );
                }
            }
        }
        for list in postings.values_mut() {
            list.postings.sort_by_key(|p| p.doc);
        }

        // Auxiliary artifact: recomputed from the full corpus state so it
        // reflects removed documents too, but byte-identical when nothing
        // changed.
        if self.config.spellcheck {
            let mut spell = SpellDictBuilder::new();
            for entry in &entries {
                let unit = read_lazy(&scratch, &entry.lazy_path)?;
                for span in &unit.tokens {
                    let word = unit.text[span.start as usize..span.end as usize].to_lowercase();
                    spell.add_word(&word, 1);
                }
            }
            spell.write(&scratch)?;
        }

        let manifest_docs = entries.clone();
        let generation = match &live {
            Some(live_gen) if live_gen.manifest().docs == manifest_docs => {
                live_gen.generation()
            }
            Some(live_gen) => live_gen.generation() + 1,
            None => 1,
        };

        write_primary(&scratch, &postings)?;
        write_manifest(
            &scratch,
            &GenerationManifest::new(&self.config.index_name, generation, manifest_docs),
        )?;

        info!(
            index = %self.config.index_name,
            generation,
            indexed,
            carried = carried_ords.len(),
            removed,
            "build complete"
        );

        Ok(BuildReport {
            indexed,
            carried: carried_ords.len(),
            removed,
            generation,
        })
    }
}

/// Hard-link a carried-forward artifact into the scratch build, copying
/// when the filesystem cannot link (e.g. across devices).
fn link_or_copy(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::hard_link(src, dst).is_err() {
        fs::copy(src, dst).map_err(|e| {
            FolioError::Build(format!(
                "cannot carry forward '{}': {}",
                src.display(),
                e
            ))
        })?;
    }
    Ok(())
}
