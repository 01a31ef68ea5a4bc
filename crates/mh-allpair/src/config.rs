use std::path::Path;

use anyhow::{bail, Context};
use mh_core::{LshConfig, MinhashConfig};
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllPairConfig {
    #[serde(default)]
    pub minhash: MinhashConfig,
    #[serde(default)]
    pub lsh: LshConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// First token of each line is the set id.
    #[serde(default = "default_true")]
    pub has_id: bool,
    /// Report a set paired with itself.
    #[serde(default)]
    pub self_pairs: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            has_id: true,
            self_pairs: false,
            workers: default_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl AllPairConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Signature size of the index follows the sketch size.
    pub fn with_num_hash(mut self, num_hash: usize) -> Self {
        self.minhash.num_hash = num_hash;
        self.lsh.signature_size = num_hash;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.minhash.validate()?;
        self.lsh.validate()?;
        if self.lsh.signature_size != self.minhash.num_hash {
            bail!(
                "index signature size {} does not match minhash size {}",
                self.lsh.signature_size,
                self.minhash.num_hash
            );
        }
        if self.pipeline.workers == 0 {
            bail!("pipeline.workers must be at least 1");
        }
        if self.pipeline.queue_capacity == 0 {
            bail!("pipeline.queue_capacity must be at least 1");
        }
        Ok(())
    }
}
