use serde::{Deserialize, Serialize};

use crate::error::{LshError, Result};
use crate::types::KeyWidth;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_NUM_HASH: usize = 128;
pub const DEFAULT_THRESHOLD: f64 = 0.9;
pub const DEFAULT_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinhashConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_num_hash")]
    pub num_hash: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LshConfig {
    #[serde(default = "default_num_hash")]
    pub signature_size: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_weight")]
    pub false_positive_weight: f64,
    #[serde(default = "default_weight")]
    pub false_negative_weight: f64,
    #[serde(default)]
    pub key_width: KeyWidth,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_num_hash() -> usize {
    DEFAULT_NUM_HASH
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

impl Default for MinhashConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            num_hash: DEFAULT_NUM_HASH,
        }
    }
}

impl MinhashConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_hash == 0 {
            return Err(LshError::InvalidSignatureSize(self.num_hash));
        }
        Ok(())
    }
}

impl Default for LshConfig {
    fn default() -> Self {
        Self {
            signature_size: DEFAULT_NUM_HASH,
            threshold: DEFAULT_THRESHOLD,
            false_positive_weight: DEFAULT_WEIGHT,
            false_negative_weight: DEFAULT_WEIGHT,
            key_width: KeyWidth::Wide,
        }
    }
}

impl LshConfig {
    pub fn new(signature_size: usize, threshold: f64) -> Self {
        Self {
            signature_size,
            threshold,
            ..Self::default()
        }
    }

    pub fn with_weights(mut self, false_positive: f64, false_negative: f64) -> Self {
        self.false_positive_weight = false_positive;
        self.false_negative_weight = false_negative;
        self
    }

    pub fn with_key_width(mut self, key_width: KeyWidth) -> Self {
        self.key_width = key_width;
        self
    }

    /// Rejects anything the parameter search cannot work with. Never clamps.
    pub fn validate(&self) -> Result<()> {
        if self.signature_size == 0 {
            return Err(LshError::InvalidSignatureSize(self.signature_size));
        }
        // NaN fails both comparisons
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(LshError::InvalidThreshold(self.threshold));
        }
        let (fp, fn_) = (self.false_positive_weight, self.false_negative_weight);
        let weight_ok = |w: f64| w.is_finite() && w >= 0.0;
        if !weight_ok(fp) || !weight_ok(fn_) || fp + fn_ == 0.0 {
            return Err(LshError::InvalidWeights {
                false_positive: fp,
                false_negative: fn_,
            });
        }
        Ok(())
    }

    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
