//! End-to-end regression: build, differential sync, rotation, serving.
//!
//! Walks one document through three versions (Africa -> America ->
//! Antarctica), asserting the slot layout around every rotation, the
//! differential-sync transcript, and that search and view always reflect
//! the live generation.

use std::fs;

use folio::{IndexBuilder, IndexConfig, SearchServer, SlotPaths, SyncReport};
use tempfile::TempDir;

struct Harness {
    _tmp: TempDir,
    corpus_dir: std::path::PathBuf,
    builder: IndexBuilder,
    server: SearchServer,
}

impl Harness {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let corpus_dir = tmp.path().join("data");
        let index_root = tmp.path().join("idx");
        fs::create_dir_all(&corpus_dir).unwrap();
        fs::create_dir_all(&index_root).unwrap();
        // A second document that never changes, to prove unrelated units
        // are never re-synchronized
        fs::write(
            corpus_dir.join("doc2.txt"),
            "Gardening in dry climates\nWater-wise planting strategies\n",
        )
        .unwrap();

        let config = IndexConfig::new(corpus_dir.clone(), index_root);
        let server = SearchServer::new(&config);
        let builder = IndexBuilder::new(config);
        Self {
            _tmp: tmp,
            corpus_dir,
            builder,
            server,
        }
    }

    fn slots(&self) -> SlotPaths {
        self.server.rotator().slots().clone()
    }

    fn write_doc1(&self, term: &str) {
        let content = format!(
            "The Global Relevance of South {}\n\n\
             Options for the New South {}\n\
             A survey of policy debates, trade patterns, and the levers of\n\
             regional development across the southern hemisphere.\n",
            term, term
        );
        fs::write(self.corpus_dir.join("doc1.txt"), content).unwrap();
    }

    /// Build and stage, like one run of the indexer CLI
    fn index(&self) -> Option<SyncReport> {
        self.builder.build(&self.slots()).unwrap();
        self.server.rotator().stage().unwrap()
    }
}

#[test]
fn end_to_end_three_versions() {
    let h = Harness::new();
    let slots = h.slots();

    // ---- Version 1 ----
    h.write_doc1("Africa");
    h.index().unwrap();

    // Staged but not yet rotated
    assert!(slots.pending_dir().exists());
    assert!(!slots.live_dir().exists());

    // Serving layer refresh performs the first promotion
    assert!(h.server.refresh().unwrap());
    assert!(!slots.pending_dir().exists());
    assert!(slots.live_dir().exists());
    // No prior generation to demote
    assert!(!slots.spare_dir().exists());

    let response = h.server.search("africa", 10).unwrap();
    assert_eq!(response.generation, 1);
    assert!(response.results[0]
        .snippets
        .iter()
        .any(|s| s == "Options for the New South <span class=\"hit\">Africa</span>"));

    let view = h.server.view("doc1.txt", "africa").unwrap();
    assert!(view
        .markup
        .contains("The Global Relevance of South <hit no=\"1\"><term>Africa</term></hit>"));

    // ---- Version 2 ----
    h.write_doc1("America");
    h.index().unwrap();

    // Pre-rotation: pending and live coexist, no spare yet
    assert!(slots.pending_dir().exists());
    assert!(slots.live_dir().exists());
    assert!(!slots.spare_dir().exists());

    // The new keyword is invisible until rotation
    let stale = h.server.search("america", 10).unwrap();
    assert_eq!(stale.generation, 1);
    assert_eq!(stale.total_hits, 0);

    assert!(h.server.refresh().unwrap());
    assert!(!slots.pending_dir().exists());
    assert!(slots.live_dir().exists());
    assert!(slots.spare_dir().exists());

    let response = h.server.search("america", 10).unwrap();
    assert_eq!(response.generation, 2);
    assert!(response.results[0]
        .snippets
        .iter()
        .any(|s| s == "Options for the New South <span class=\"hit\">America</span>"));
    // And the old keyword is gone
    assert_eq!(h.server.search("africa", 10).unwrap().total_hits, 0);

    let view = h.server.view("doc1.txt", "america").unwrap();
    assert!(view
        .markup
        .contains("The Global Relevance of South <hit no=\"1\"><term>America</term></hit>"));

    // ---- Version 3 ----
    h.write_doc1("Antarctica");
    let sync = h.index().unwrap();

    // Differential minimality: exactly the edited document's lazy unit
    // and the changed spelling dictionary -- not doc2's unit
    assert_eq!(
        sync.units,
        vec![
            "lazy/default/doc1.txt.lazy".to_string(),
            "spellDict/edmap.dat".to_string()
        ]
    );

    assert!(slots.pending_dir().exists());
    assert!(slots.live_dir().exists());
    assert!(!slots.spare_dir().exists());

    assert!(h.server.refresh().unwrap());
    assert!(!slots.pending_dir().exists());
    assert!(slots.live_dir().exists());
    assert!(slots.spare_dir().exists());

    let response = h.server.search("antarctica", 10).unwrap();
    assert_eq!(response.generation, 3);
    assert!(response.results[0]
        .snippets
        .iter()
        .any(|s| s == "Options for the New South <span class=\"hit\">Antarctica</span>"));

    let view = h.server.view("doc1.txt", "antarctica").unwrap();
    assert!(view.markup.contains(
        "The Global Relevance of South <hit no=\"1\"><term>Antarctica</term></hit>"
    ));

    // The untouched document was searchable through every generation
    let response = h.server.search("gardening", 10).unwrap();
    assert_eq!(response.results[0].doc_id, "doc2.txt");
}

#[test]
fn repeated_build_of_unchanged_corpus_stages_nothing() {
    let h = Harness::new();
    h.write_doc1("Africa");
    h.index().unwrap();
    h.server.refresh().unwrap();
    let generation = h.server.search("africa", 10).unwrap().generation;

    // Same corpus, full rebuild: nothing differs, so nothing is staged
    assert!(h.index().is_none());
    let slots = h.slots();
    assert!(!slots.pending_dir().exists());
    assert!(!slots.new_dir().exists());

    // Nothing to promote either; the live generation is untouched
    assert!(!h.server.refresh().unwrap());
    let response = h.server.search("africa", 10).unwrap();
    assert_eq!(response.generation, generation);
    assert_eq!(response.results.len(), 1);
}

#[test]
fn spare_is_exactly_the_previous_live_generation() {
    let h = Harness::new();
    let slots = h.slots();

    h.write_doc1("Africa");
    h.index().unwrap();
    h.server.refresh().unwrap();
    let live_manifest_v1 = fs::read(slots.live_dir().join("generation.json")).unwrap();

    h.write_doc1("America");
    h.index().unwrap();
    h.server.refresh().unwrap();

    let spare_manifest = fs::read(slots.spare_dir().join("generation.json")).unwrap();
    assert_eq!(spare_manifest, live_manifest_v1);
}

#[test]
fn aborted_build_leaves_published_generation_intact() {
    let h = Harness::new();
    let slots = h.slots();

    h.write_doc1("Africa");
    h.index().unwrap();
    h.server.refresh().unwrap();

    // Corpus vanishes: the next build must fail without touching live
    fs::remove_dir_all(&h.corpus_dir).unwrap();
    assert!(h.builder.build(&slots).is_err());

    assert!(slots.live_dir().exists());
    assert!(!slots.pending_dir().exists());
    let response = h.server.search("africa", 10).unwrap();
    assert_eq!(response.total_hits, 1);
}
