use serde::{Deserialize, Serialize};
use std::fmt;

/// MinHash signature: one minimum per hash function, in hash-function order.
pub type Signature = Vec<u64>;

/// Bytes kept from each signature value when building a band key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyWidth {
    /// Top 16 bits of each value.
    Narrow,
    /// Full 64-bit values.
    Wide,
}

impl KeyWidth {
    pub fn bytes_per_value(&self) -> usize {
        match self {
            Self::Narrow => 2,
            Self::Wide => 8,
        }
    }
}

impl Default for KeyWidth {
    fn default() -> Self {
        Self::Wide
    }
}

impl fmt::Display for KeyWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Narrow => write!(f, "narrow"),
            Self::Wide => write!(f, "wide"),
        }
    }
}

/// Banding chosen for an index: `bands` tables, each keyed on `rows_per_band` values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandParams {
    pub rows_per_band: usize,
    pub bands: usize,
    /// Integrated false-positive area of this banding below the threshold.
    pub false_positive: f64,
    /// Integrated false-negative area of this banding at or above the threshold.
    pub false_negative: f64,
}

impl BandParams {
    /// Number of signature values consumed by the bands.
    pub fn span(&self) -> usize {
        self.rows_per_band * self.bands
    }

    /// `(k, l)`.
    pub fn kl(&self) -> (usize, usize) {
        (self.rows_per_band, self.bands)
    }
}
