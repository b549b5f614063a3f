//! Query serving against the live generation

mod facade;
mod snippet;

pub use facade::{DocView, SearchHit, SearchResponse, SearchServer};
pub use snippet::{markup_document, snippet_lines};
