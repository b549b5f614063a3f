use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use folio::{IndexBuilder, IndexConfig, Rotator, SearchServer, SlotPaths};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Text indexing and search serving with atomic index rotation", long_about = None)]
struct Args {
    /// Trace level (error, warn, info, debug)
    #[arg(long, global = true, default_value = "info")]
    trace: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the index and stage it for rotation
    Index {
        /// Directory containing the source documents
        #[arg(long, env = "FOLIO_CORPUS_DIR")]
        source: PathBuf,

        /// Directory holding the rotation slots
        #[arg(long, env = "FOLIO_INDEX_ROOT")]
        root: PathBuf,

        /// Index name (names the lazy-unit subtree)
        #[arg(long, default_value = "default")]
        index: String,

        /// Force a full rebuild instead of an incremental one
        #[arg(long)]
        clean: bool,

        /// Skip the spelling dictionary
        #[arg(long)]
        no_spellcheck: bool,
    },

    /// Run a keyword search against the live generation
    Search {
        #[arg(long, env = "FOLIO_INDEX_ROOT")]
        root: PathBuf,

        /// Keyword query
        #[arg(long)]
        keyword: String,

        #[arg(long, default_value = "10")]
        top_k: usize,
    },

    /// Render one document with in-context query hits
    View {
        #[arg(long, env = "FOLIO_INDEX_ROOT")]
        root: PathBuf,

        /// Document ID (path relative to the corpus root)
        #[arg(long)]
        doc: String,

        /// Query whose hits to mark
        #[arg(long)]
        query: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "folio={}",
            args.trace
        )))
        .with_target(false)
        .init();

    match args.command {
        Command::Index {
            source,
            root,
            index,
            clean,
            no_spellcheck,
        } => {
            info!("folio v{}", folio::VERSION);
            let config = IndexConfig::new(source, root)
                .with_index_name(&index)
                .with_spellcheck(!no_spellcheck);
            let rotator = Rotator::new(SlotPaths::new(&config.index_root), config.retention);
            let builder = IndexBuilder::new(config);

            let report = builder.build_opts(rotator.slots(), clean)?;
            println!(
                "built generation {}: {} indexed, {} carried forward, {} removed",
                report.generation, report.indexed, report.carried, report.removed
            );

            match rotator.stage()? {
                Some(sync) => {
                    // Machine-parsable transcript: one changed unit per line
                    for rel in &sync.units {
                        println!("{}", rel);
                    }
                    println!(
                        "staged: {} units, {} primary files, {} unchanged, {} pruned",
                        sync.units.len(),
                        sync.primary,
                        sync.unchanged,
                        sync.pruned.len()
                    );
                }
                None => println!("staging skipped"),
            }
            Ok(())
        }

        Command::Search { root, keyword, top_k } => {
            let server = open_server(root)?;
            let response = server.search(&keyword, top_k)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }

        Command::View { root, doc, query } => {
            let server = open_server(root)?;
            let view = server.view(&doc, &query)?;
            println!("{}", view.markup);
            Ok(())
        }
    }
}

/// Open a query server over an index root, promoting any staged
/// generation first (the serving layer's refresh, not the query path's).
fn open_server(root: PathBuf) -> Result<SearchServer> {
    if !root.is_dir() {
        bail!("index root '{}' does not exist", root.display());
    }
    // The corpus directory is irrelevant for serving
    let config = IndexConfig::new(root.join("unused-corpus"), root);
    let server = SearchServer::new(&config);
    server.refresh()?;
    Ok(server)
}
