//! On-disk postings format
//!
//! One generation's postings are a single ordinal-ordered table: the term
//! dictionary maps a term to its ordinal, which indexes this table. The
//! whole table is read into memory when a generation is opened, and the
//! bytes are deterministic for a given logical content so that unchanged
//! generations diff as unchanged.

use serde::{Deserialize, Serialize};

use super::types::PostingList;
use crate::error::{FolioError, Result};

const POSTINGS_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PostingsFile {
    version: u32,
    lists: Vec<PostingList>,
}

/// Serialize posting lists in ordinal order
pub fn encode_postings(lists: &[PostingList]) -> Result<Vec<u8>> {
    let file = PostingsFile {
        version: POSTINGS_VERSION,
        lists: lists.to_vec(),
    };
    Ok(bincode::serialize(&file)?)
}

/// Deserialize a postings table, checking the format version
pub fn decode_postings(data: &[u8]) -> Result<Vec<PostingList>> {
    let file: PostingsFile = bincode::deserialize(data)?;
    if file.version != POSTINGS_VERSION {
        return Err(FolioError::Corrupt(format!(
            "postings format version {} (expected {})",
            file.version, POSTINGS_VERSION
        )));
    }
    Ok(file.lists)
}
