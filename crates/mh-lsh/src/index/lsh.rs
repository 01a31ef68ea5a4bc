use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use mh_core::{BandParams, KeyWidth, LshConfig, LshError, Result, Signature};
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::table::BucketTable;
use super::IndexStats;
use crate::band;
use crate::params;

/// MinHash LSH index.
///
/// Lifecycle is build then query: `add` items, call `index` once, then
/// `query`. Adding after `index` fails with [`LshError::AlreadyIndexed`];
/// querying before `index` is allowed and sees everything added so far.
/// Re-adding an id fails with [`LshError::DuplicateId`]. A failed `add`
/// leaves every table untouched.
pub struct MinhashLsh<Id = String> {
    config: LshConfig,
    params: BandParams,
    inner: RwLock<LshInner<Id>>,
}

struct LshInner<Id> {
    tables: Vec<BucketTable<Id>>,
    ids: HashSet<Id>,
    indexed: bool,
}

impl<Id> MinhashLsh<Id>
where
    Id: Clone + Eq + Hash + Display,
{
    /// Index with full-width (8 bytes per value) band keys and equal error weights.
    pub fn new(signature_size: usize, threshold: f64) -> Result<Self> {
        Self::with_config(&LshConfig::new(signature_size, threshold))
    }

    /// Index with 2-byte-per-value band keys.
    pub fn new_narrow(signature_size: usize, threshold: f64) -> Result<Self> {
        Self::with_config(&LshConfig::new(signature_size, threshold).with_key_width(KeyWidth::Narrow))
    }

    pub fn with_config(config: &LshConfig) -> Result<Self> {
        let params = params::params_for(config)?;
        let tables = (0..params.bands).map(|_| BucketTable::new()).collect();
        debug!(
            signature_size = config.signature_size,
            threshold = config.threshold,
            key_width = %config.key_width,
            k = params.rows_per_band,
            l = params.bands,
            "created minhash lsh index"
        );
        Ok(Self {
            config: config.clone(),
            params,
            inner: RwLock::new(LshInner {
                tables,
                ids: HashSet::new(),
                indexed: false,
            }),
        })
    }

    /// `(k, l)`: rows per band and number of bands.
    pub fn params(&self) -> (usize, usize) {
        self.params.kl()
    }

    pub fn band_params(&self) -> BandParams {
        self.params
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    pub fn signature_size(&self) -> usize {
        self.config.signature_size
    }

    pub fn key_width(&self) -> KeyWidth {
        self.config.key_width
    }

    fn keys_for(&self, signature: &[u64]) -> Result<Vec<Vec<u8>>> {
        let span = self.params.span();
        if signature.len() < span {
            return Err(LshError::SignatureTooShort {
                expected: span,
                got: signature.len(),
            });
        }
        Ok(band::band_keys(
            signature,
            self.params.rows_per_band,
            self.params.bands,
            self.config.key_width,
        ))
    }

    /// Insert `id` into every band table. Values past `k * l` are ignored.
    pub fn add(&self, id: Id, signature: &[u64]) -> Result<()> {
        let keys = self.keys_for(signature)?;
        let mut inner = self.inner.write();
        if inner.indexed {
            warn!(id = %id, "add after index rejected");
            return Err(LshError::AlreadyIndexed);
        }
        if inner.ids.contains(&id) {
            warn!(id = %id, "duplicate id rejected");
            return Err(LshError::DuplicateId(id.to_string()));
        }
        inner.insert(id, keys);
        Ok(())
    }

    /// Insert many items at once. Every item is validated before any is
    /// inserted, so on error nothing is added.
    pub fn add_batch(&self, items: Vec<(Id, Signature)>) -> Result<()> {
        let mut keyed = Vec::with_capacity(items.len());
        for (id, sig) in items {
            let keys = self.keys_for(&sig)?;
            keyed.push((id, keys));
        }
        let mut inner = self.inner.write();
        if inner.indexed {
            return Err(LshError::AlreadyIndexed);
        }
        let mut seen = HashSet::with_capacity(keyed.len());
        for (id, _) in &keyed {
            if inner.ids.contains(id) || !seen.insert(id) {
                return Err(LshError::DuplicateId(id.to_string()));
            }
        }
        for (id, keys) in keyed {
            inner.insert(id, keys);
        }
        Ok(())
    }

    /// Finish the build phase. A second call does nothing.
    pub fn index(&self) {
        let mut inner = self.inner.write();
        if inner.indexed {
            return;
        }
        for table in inner.tables.iter_mut() {
            table.compact();
        }
        inner.indexed = true;
        debug!(
            items = inner.ids.len(),
            buckets = inner.tables.iter().map(BucketTable::len).sum::<usize>(),
            "index built"
        );
    }

    pub fn is_indexed(&self) -> bool {
        self.inner.read().indexed
    }

    /// Ids sharing at least one band with `signature`, each once.
    ///
    /// Order is first appearance walking bands `0..l`, then bucket insertion
    /// order, so identical inputs give identical output.
    pub fn query(&self, signature: &[u64]) -> Result<Vec<Id>> {
        let keys = self.keys_for(signature)?;
        let inner = self.inner.read();
        let mut seen: HashSet<&Id> = HashSet::new();
        let mut result = Vec::new();
        for (table, key) in inner.tables.iter().zip(keys.iter()) {
            if let Some(ids) = table.get(key) {
                for id in ids {
                    if seen.insert(id) {
                        result.push(id.clone());
                    }
                }
            }
        }
        Ok(result)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.inner.read().ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Contents of every non-empty bucket in band table `band`.
    pub fn table_buckets(&self, band: usize) -> Option<Vec<Vec<Id>>> {
        self.inner.read().tables.get(band).map(BucketTable::buckets)
    }

    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read();
        IndexStats {
            items: inner.ids.len(),
            rows_per_band: self.params.rows_per_band,
            bands: self.params.bands,
            buckets_per_table: inner.tables.iter().map(BucketTable::len).collect(),
            largest_bucket: inner.tables.iter().map(BucketTable::largest_bucket).max().unwrap_or(0),
            indexed: inner.indexed,
        }
    }
}

impl<Id: Clone + Eq + Hash> LshInner<Id> {
    fn insert(&mut self, id: Id, keys: Vec<Vec<u8>>) {
        for (table, key) in self.tables.iter_mut().zip(keys) {
            table.insert(key, id.clone());
        }
        self.ids.insert(id);
    }
}
