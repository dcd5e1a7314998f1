//! Ingestion pipeline: XML export → normalized posts → top posts by views →
//! collection replace.

pub mod load;
pub mod normalize;
pub mod rank;

pub use load::replace_collection;
pub use normalize::{decode_tags, normalize_record, normalize_records};
pub use rank::top_by_view_count;

use crate::constants::MAX_POSTS;
use crate::error::Result;
use crate::parser;
use crate::storage::PostStore;
use std::path::Path;
use tracing::{info, instrument};

/// Result of a complete ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub rows_parsed: usize,
    pub posts_kept: usize,
    pub inserted: u64,
}

/// Runs the whole ingestion against `store`.
///
/// Parsing and normalization finish before the store is touched, so a bad
/// input file leaves the existing collection as it was.
#[instrument(skip(store))]
pub async fn run_ingest(input: &Path, store: &dyn PostStore) -> Result<IngestSummary> {
    info!("Reading XML file {}...", input.display());
    let records = parser::load_rows(input)?;

    info!("Processing {} rows...", records.len());
    let posts = normalize_records(&records);
    let posts = top_by_view_count(posts, MAX_POSTS);
    info!("Keeping the {} most viewed posts", posts.len());

    let inserted = replace_collection(store, &posts).await?;
    info!("Data loaded successfully");

    Ok(IngestSummary {
        rows_parsed: records.len(),
        posts_kept: posts.len(),
        inserted,
    })
}
