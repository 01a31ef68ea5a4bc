use std::collections::HashMap;
use std::hash::Hash;

/// One band's buckets: band key -> ids whose band hashed to that key.
pub(crate) struct BucketTable<Id> {
    buckets: HashMap<Vec<u8>, Vec<Id>>,
}

impl<Id: Clone + Eq + Hash> BucketTable<Id> {
    pub fn new() -> Self {
        Self { buckets: HashMap::new() }
    }

    pub fn insert(&mut self, key: Vec<u8>, id: Id) {
        self.buckets.entry(key).or_default().push(id);
    }

    pub fn get(&self, key: &[u8]) -> Option<&[Id]> {
        self.buckets.get(key).map(|ids| ids.as_slice())
    }

    /// Number of non-empty buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn largest_bucket(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn buckets(&self) -> Vec<Vec<Id>> {
        self.buckets.values().cloned().collect()
    }

    /// Release slack left by incremental inserts.
    pub fn compact(&mut self) {
        for ids in self.buckets.values_mut() {
            ids.shrink_to_fit();
        }
        self.buckets.shrink_to_fit();
    }
}
