//! LSH bucket index over MinHash signatures.

mod lsh;
mod table;

pub use lsh::MinhashLsh;

use serde::{Deserialize, Serialize};

/// Snapshot of an index's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub items: usize,
    pub rows_per_band: usize,
    pub bands: usize,
    /// Non-empty buckets in each band table.
    pub buckets_per_table: Vec<usize>,
    pub largest_bucket: usize,
    pub indexed: bool,
}

impl IndexStats {
    pub fn total_buckets(&self) -> usize {
        self.buckets_per_table.iter().sum()
    }
}
