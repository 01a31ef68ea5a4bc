//! Signature creation, indexing and all-pairs querying.
//!
//! A blocking reader feeds parsed sets into a bounded queue drained by a pool
//! of sketch workers. Signatures are collected and put back into file order,
//! then inserted by a single writer. Querying fans out over the built index
//! and streams pairs to the output in file order.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use mh_core::{LshConfig, MinhashConfig, Signature};
use mh_lsh::{Minhash, MinhashLsh};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::AllPairConfig;
use crate::output::{self, Pair};
use crate::setfile::{self, SetFileError, SetRecord};

/// A set's signature, tagged with its position in the input.
#[derive(Debug, Clone)]
pub struct SetSig {
    pub seq: usize,
    pub id: String,
    pub size: usize,
    pub signature: Signature,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sets: usize,
    pub pairs: usize,
    pub rows_per_band: usize,
    pub bands: usize,
}

pub fn sketch_set(record: &SetRecord, config: &MinhashConfig) -> SetSig {
    let mut mh = Minhash::new(config.seed, config.num_hash);
    for value in &record.values {
        mh.push(value.as_bytes());
    }
    SetSig {
        seq: record.seq,
        id: record.id.clone(),
        size: record.values.len(),
        signature: mh.signature(),
    }
}

/// Read `path` and sketch every set, returning signatures in file order.
pub async fn create_signatures(path: &Path, config: &AllPairConfig) -> anyhow::Result<Vec<SetSig>> {
    let capacity = config.pipeline.queue_capacity;
    let (set_tx, set_rx) = mpsc::channel::<SetRecord>(capacity);
    let (sig_tx, mut sig_rx) = mpsc::channel::<SetSig>(capacity);

    let path: PathBuf = path.to_path_buf();
    let has_id = config.pipeline.has_id;
    let reader = tokio::task::spawn_blocking(move || -> Result<usize, SetFileError> {
        let mut count = 0;
        for record in setfile::open(&path, has_id)? {
            // Receivers only go away when the workers stop early
            if set_tx.blocking_send(record?).is_err() {
                break;
            }
            count += 1;
        }
        Ok(count)
    });

    let set_rx = Arc::new(Mutex::new(set_rx));
    let mut workers = JoinSet::new();
    for _ in 0..config.pipeline.workers {
        let rx = Arc::clone(&set_rx);
        let tx = sig_tx.clone();
        let minhash = config.minhash.clone();
        workers.spawn_blocking(move || loop {
            let next = rx.blocking_lock().blocking_recv();
            let Some(record) = next else { break };
            if tx.blocking_send(sketch_set(&record, &minhash)).is_err() {
                break;
            }
        });
    }
    drop(sig_tx);

    let mut sigs = Vec::new();
    while let Some(sig) = sig_rx.recv().await {
        sigs.push(sig);
    }
    while let Some(joined) = workers.join_next().await {
        joined.context("sketch worker panicked")?;
    }
    let count = reader.await.context("set reader panicked")??;
    debug!(count, "read sets");

    sigs.sort_by_key(|s| s.seq);
    Ok(sigs)
}

/// Single-writer build over collected signatures.
pub fn build_index(sigs: &[SetSig], config: &LshConfig) -> mh_core::Result<MinhashLsh<String>> {
    let lsh = MinhashLsh::with_config(config)?;
    for s in sigs {
        lsh.add(s.id.clone(), &s.signature)?;
    }
    lsh.index();
    Ok(lsh)
}

/// Candidate pairs of one set. Holds a permit until written out.
struct PairBatch {
    seq: usize,
    pairs: Vec<Pair>,
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StreamStats {
    pub pairs: usize,
    /// Most per-set batches queried but not yet written at any moment.
    pub max_in_flight: usize,
}

fn query_set(lsh: &MinhashLsh<String>, set: &SetSig, self_pairs: bool) -> mh_core::Result<Vec<Pair>> {
    let mut pairs = Vec::new();
    for candidate in lsh.query(&set.signature)? {
        if !self_pairs && candidate == set.id {
            continue;
        }
        pairs.push(Pair::new(set.id.clone(), candidate));
    }
    Ok(pairs)
}

/// Query every set against the built index and write pairs to `out` in
/// input order as they become available.
///
/// Workers claim sets one at a time and may only claim a set while holding
/// one of `capacity` permits; a permit is released once that set's pairs are
/// written. At most `capacity` sets' pairs are held in memory at once.
pub async fn stream_pairs<W: Write>(
    lsh: Arc<MinhashLsh<String>>,
    sigs: Arc<Vec<SetSig>>,
    self_pairs: bool,
    workers: usize,
    capacity: usize,
    out: &mut W,
) -> anyhow::Result<StreamStats> {
    let capacity = capacity.max(1);
    let (tx, mut rx) = mpsc::channel::<mh_core::Result<PairBatch>>(capacity);
    let permits = Arc::new(Semaphore::new(capacity));
    let next_seq = Arc::new(AtomicUsize::new(0));
    let handle = Handle::current();

    let mut queriers = JoinSet::new();
    for _ in 0..workers.max(1) {
        let lsh = Arc::clone(&lsh);
        let sigs = Arc::clone(&sigs);
        let permits = Arc::clone(&permits);
        let next_seq = Arc::clone(&next_seq);
        let handle = handle.clone();
        let tx = tx.clone();
        queriers.spawn_blocking(move || loop {
            // Claim a set only after taking a permit, so claimed sets form a
            // prefix and the lowest unwritten one always holds a permit.
            let Ok(permit) = handle.block_on(Arc::clone(&permits).acquire_owned()) else { break };
            let seq = next_seq.fetch_add(1, Ordering::Relaxed);
            let Some(set) = sigs.get(seq) else { break };
            let batch = query_set(&lsh, set, self_pairs).map(|pairs| PairBatch {
                seq,
                pairs,
                _permit: permit,
            });
            let failed = batch.is_err();
            if tx.blocking_send(batch).is_err() || failed {
                break;
            }
        });
    }
    drop(tx);

    let mut pending: BTreeMap<usize, PairBatch> = BTreeMap::new();
    let mut next = 0;
    let mut stats = StreamStats::default();
    while let Some(batch) = rx.recv().await {
        let batch = batch.context("querying index")?;
        pending.insert(batch.seq, batch);
        stats.max_in_flight = stats.max_in_flight.max(pending.len());
        while let Some(ready) = pending.remove(&next) {
            stats.pairs += output::write_pairs(out, &ready.pairs).context("writing pairs")?;
            next += 1;
        }
    }
    while let Some(joined) = queriers.join_next().await {
        joined.context("query worker panicked")?;
    }
    out.flush().context("flushing pairs")?;
    Ok(stats)
}

/// Run the whole pipeline over `input`, writing pairs to `out`.
pub async fn run<W: Write>(config: &AllPairConfig, input: &Path, out: &mut W) -> anyhow::Result<RunSummary> {
    config.validate()?;

    let start = Instant::now();
    let sigs = create_signatures(input, config)
        .await
        .with_context(|| format!("creating signatures from {}", input.display()))?;
    info!(sets = sigs.len(), secs = start.elapsed().as_secs_f64(), "created minhash signatures");

    let start = Instant::now();
    let lsh = build_index(&sigs, &config.lsh).context("building index")?;
    let (k, l) = lsh.params();
    info!(k, l, secs = start.elapsed().as_secs_f64(), "indexed signatures");

    let start = Instant::now();
    let sets = sigs.len();
    let stats = stream_pairs(
        Arc::new(lsh),
        Arc::new(sigs),
        config.pipeline.self_pairs,
        config.pipeline.workers,
        config.pipeline.queue_capacity,
        out,
    )
    .await?;
    info!(
        pairs = stats.pairs,
        max_in_flight = stats.max_in_flight,
        secs = start.elapsed().as_secs_f64(),
        "all pair search done"
    );

    Ok(RunSummary {
        sets,
        pairs: stats.pairs,
        rows_per_band: k,
        bands: l,
    })
}
