//! MinHash sketch and signature helpers.
//!
//! Each sketch derives two FNV-1a hash functions from a seed and realizes
//! `num_hash` min-wise functions from them by double hashing:
//! `h_i(x) = h1(x) + i * h2(x)`.

use std::hash::Hasher;
use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use fnv::FnvHasher;
use mh_core::{LshError, Result, Signature};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bytes per serialized signature value.
pub const HASH_VALUE_SIZE: usize = 8;

/// A MinHash sketch under construction.
#[derive(Debug, Clone)]
pub struct Minhash {
    seed: u64,
    nonce1: [u8; HASH_VALUE_SIZE],
    nonce2: [u8; HASH_VALUE_SIZE],
    mins: Signature,
}

impl Minhash {
    /// Create an empty sketch with `num_hash` hash functions derived from `seed`.
    pub fn new(seed: u64, num_hash: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        // 63-bit draws, as a non-negative i64 source would give
        let nonce1 = (rng.gen::<u64>() >> 1).to_be_bytes();
        let nonce2 = (rng.gen::<u64>() >> 1).to_be_bytes();
        Self {
            seed,
            nonce1,
            nonce2,
            mins: vec![u64::MAX; num_hash],
        }
    }

    /// Rehydrate a sketch from a stored signature, e.g. one read back with
    /// [`bytes_to_sig`]. The seed must be the one the signature was built with.
    pub fn from_signature(seed: u64, signature: Signature) -> Self {
        let mut mh = Self::new(seed, 0);
        mh.mins = signature;
        mh
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn num_hash(&self) -> usize {
        self.mins.len()
    }

    /// Add one element, given as its byte encoding.
    pub fn push(&mut self, value: &[u8]) {
        let v1 = fnv_with_prefix(&self.nonce1, value);
        let v2 = fnv_with_prefix(&self.nonce2, value);
        for (i, min) in self.mins.iter_mut().enumerate() {
            let hv = v1.wrapping_add((i as u64).wrapping_mul(v2));
            if hv < *min {
                *min = hv;
            }
        }
    }

    /// Current signature. Untouched positions stay at `u64::MAX`.
    pub fn signature(&self) -> Signature {
        self.mins.clone()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.mins
    }

    /// Fold `other` into this sketch so it carries the signature of the union.
    pub fn merge(&mut self, other: &Minhash) -> Result<()> {
        self.check_compatible(other)?;
        for (a, &b) in self.mins.iter_mut().zip(other.mins.iter()) {
            if b < *a {
                *a = b;
            }
        }
        Ok(())
    }

    /// Estimated Jaccard similarity: fraction of positions that agree.
    pub fn jaccard(&self, other: &Minhash) -> Result<f64> {
        self.check_compatible(other)?;
        if self.mins.is_empty() {
            return Ok(0.0);
        }
        let matches = sig_matches(&self.mins, &other.mins)?;
        Ok(matches as f64 / self.mins.len() as f64)
    }

    fn check_compatible(&self, other: &Minhash) -> Result<()> {
        if self.seed != other.seed {
            return Err(LshError::SeedMismatch {
                left: self.seed,
                right: other.seed,
            });
        }
        if self.mins.len() != other.mins.len() {
            return Err(LshError::LengthMismatch {
                expected: self.mins.len(),
                got: other.mins.len(),
            });
        }
        Ok(())
    }
}

fn fnv_with_prefix(prefix: &[u8], value: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(prefix);
    hasher.write(value);
    hasher.finish()
}

/// Count positions where two signatures hold the same value.
pub fn sig_matches(sig1: &[u64], sig2: &[u64]) -> Result<usize> {
    if sig1.len() != sig2.len() {
        return Err(LshError::LengthMismatch {
            expected: sig1.len(),
            got: sig2.len(),
        });
    }
    Ok(sig1.iter().zip(sig2).filter(|(a, b)| a == b).count())
}

/// Serialize a signature as big-endian 8-byte values.
pub fn sig_to_bytes(sig: &[u64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(sig.len() * HASH_VALUE_SIZE);
    for &v in sig {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    buf
}

/// Inverse of [`sig_to_bytes`].
pub fn bytes_to_sig(data: &[u8]) -> Result<Signature> {
    if data.len() % HASH_VALUE_SIZE != 0 {
        return Err(LshError::MalformedBytes(data.len()));
    }
    let mut cursor = Cursor::new(data);
    let mut sig = Vec::with_capacity(data.len() / HASH_VALUE_SIZE);
    for _ in 0..data.len() / HASH_VALUE_SIZE {
        sig.push(cursor.read_u64::<BigEndian>()?);
    }
    Ok(sig)
}
