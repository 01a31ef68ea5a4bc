//! Band key encoding.
//!
//! A band of `k` signature values becomes a `k * width` byte key holding the
//! top `width` bytes of each value in big-endian order. Truncation is the only
//! source of collisions between different bands.

use mh_core::KeyWidth;

/// Encode one band into its bucket key.
pub fn encode_band(band: &[u64], width: KeyWidth) -> Vec<u8> {
    let n = width.bytes_per_value();
    let mut key = Vec::with_capacity(band.len() * n);
    for v in band {
        key.extend_from_slice(&v.to_be_bytes()[..n]);
    }
    key
}

/// Keys for the first `bands` bands of `rows_per_band` values each.
/// Callers check that the signature is long enough.
pub fn band_keys(signature: &[u64], rows_per_band: usize, bands: usize, width: KeyWidth) -> Vec<Vec<u8>> {
    signature[..rows_per_band * bands]
        .chunks_exact(rows_per_band)
        .map(|band| encode_band(band, width))
        .collect()
}
