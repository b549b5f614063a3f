pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod rotate;
pub mod server;
pub mod sync;
pub mod tokenizer;

pub use config::{IndexConfig, RetentionPolicy, TokenizerConfig};
pub use error::{FolioError, Result};
pub use index::{BuildReport, Generation, IndexBuilder};
pub use rotate::{Rotator, SlotPaths, Warmer};
pub use server::{DocView, SearchResponse, SearchServer};
pub use sync::SyncReport;
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
