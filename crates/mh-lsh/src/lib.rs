//! MinHash LSH - approximate Jaccard similarity search over sets.
//!
//! Provides MinHash sketches, banding parameter selection, band key encoding,
//! and a multi-table bucket index returning candidates likely above a
//! similarity threshold.

pub mod band;
pub mod index;
pub mod minhash;
pub mod params;

pub use index::{IndexStats, MinhashLsh};
pub use minhash::{bytes_to_sig, sig_matches, sig_to_bytes, Minhash};
pub use params::optimal_params;

pub use mh_core::{BandParams, KeyWidth, LshConfig, LshError, Result, Signature};
