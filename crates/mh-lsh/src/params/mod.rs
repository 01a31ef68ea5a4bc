//! Banding parameter search.
//!
//! Two items of Jaccard similarity `s` share at least one of `l` bands of
//! `k` rows with probability `P(s) = 1 - (1 - s^k)^l`. The optimizer picks the
//! `(k, l)` minimizing the weighted area of `P` below the threshold (false
//! positives) plus the area of `1 - P` above it (false negatives).

use mh_core::{BandParams, LshConfig, LshError, Result};
use tracing::debug;

/// Step of the midpoint-rule integration over `[0, 1]`.
pub const INTEGRATION_PRECISION: f64 = 0.01;

/// Probability that two items of similarity `s` collide in at least one band.
pub fn collision_probability(s: f64, rows_per_band: usize, bands: usize) -> f64 {
    1.0 - (1.0 - s.powi(rows_per_band as i32)).powi(bands as i32)
}

fn integrate<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, precision: f64) -> f64 {
    if b <= a {
        return 0.0;
    }
    // Step count from the interval, so float drift cannot add a sample
    let steps = ((b - a) / precision - 1e-9).ceil() as usize;
    (0..steps)
        .map(|i| f(a + (i as f64 + 0.5) * precision) * precision)
        .sum()
}

/// Area under the collision curve for similarities below `threshold`.
pub fn false_positive_area(threshold: f64, rows_per_band: usize, bands: usize) -> f64 {
    integrate(
        |s| collision_probability(s, rows_per_band, bands),
        0.0,
        threshold,
        INTEGRATION_PRECISION,
    )
}

/// Area above the collision curve for similarities at or above `threshold`.
pub fn false_negative_area(threshold: f64, rows_per_band: usize, bands: usize) -> f64 {
    integrate(
        |s| 1.0 - collision_probability(s, rows_per_band, bands),
        threshold,
        1.0,
        INTEGRATION_PRECISION,
    )
}

/// Choose `(k, l)` for a signature of `signature_size` values.
///
/// Candidates come from scanning `l = 1..=n` with `k = n / l`; the first
/// candidate reaching the minimum weighted error wins, so lower `l` is
/// preferred on ties.
pub fn optimal_params(
    signature_size: usize,
    threshold: f64,
    false_positive_weight: f64,
    false_negative_weight: f64,
) -> Result<BandParams> {
    LshConfig::new(signature_size, threshold)
        .with_weights(false_positive_weight, false_negative_weight)
        .validate()?;

    let mut best: Option<(f64, BandParams)> = None;
    for bands in 1..=signature_size {
        let rows_per_band = signature_size / bands;
        let fp = false_positive_area(threshold, rows_per_band, bands);
        let fn_ = false_negative_area(threshold, rows_per_band, bands);
        let error = false_positive_weight * fp + false_negative_weight * fn_;
        if best.as_ref().map_or(true, |(e, _)| error < *e) {
            best = Some((
                error,
                BandParams {
                    rows_per_band,
                    bands,
                    false_positive: fp,
                    false_negative: fn_,
                },
            ));
        }
    }

    let (error, params) = best.ok_or(LshError::NoBandParams(signature_size))?;
    if params.rows_per_band == 0 || params.span() == 0 {
        return Err(LshError::NoBandParams(signature_size));
    }
    debug!(
        signature_size,
        threshold,
        k = params.rows_per_band,
        l = params.bands,
        fp = params.false_positive,
        fn_ = params.false_negative,
        error,
        "selected banding parameters"
    );
    Ok(params)
}

/// [`optimal_params`] driven by an [`LshConfig`].
pub fn params_for(config: &LshConfig) -> Result<BandParams> {
    optimal_params(
        config.signature_size,
        config.threshold,
        config.false_positive_weight,
        config.false_negative_weight,
    )
}
