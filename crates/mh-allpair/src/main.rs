use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mh_core::KeyWidth;
use mh_allpair::{run, AllPairConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "minhash-lsh-all-pair")]
#[command(about = "Find all pairs of similar sets in a set file with MinHash LSH")]
#[command(version)]
struct Args {
    /// The set file as input
    #[arg(long)]
    input: PathBuf,

    /// JSON config file; explicit flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// The MinHash seed
    #[arg(long)]
    seed: Option<u64>,

    /// The MinHash signature size in number of hash functions
    #[arg(long)]
    sigsize: Option<usize>,

    /// The Jaccard similarity threshold
    #[arg(long)]
    threshold: Option<f64>,

    /// Allow self-pairs in results
    #[arg(long)]
    selfpair: bool,

    /// Lines have no leading ID field; line numbers are used instead
    #[arg(long)]
    no_id_field: bool,

    /// Keep only the top 16 bits of each value in band keys
    #[arg(long)]
    narrow_keys: bool,

    /// Sketch and query workers
    #[arg(long)]
    workers: Option<usize>,

    /// Capacity of the bounded set and signature queues
    #[arg(long)]
    queue_capacity: Option<usize>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(AllPairConfig, PathBuf)> {
        let mut config = match &self.config {
            Some(path) => AllPairConfig::load(path)?,
            None => AllPairConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.minhash.seed = seed;
        }
        if let Some(n) = self.sigsize {
            config = config.with_num_hash(n);
        }
        if let Some(t) = self.threshold {
            config.lsh.threshold = t;
        }
        if self.selfpair {
            config.pipeline.self_pairs = true;
        }
        if self.no_id_field {
            config.pipeline.has_id = false;
        }
        if self.narrow_keys {
            config.lsh.key_width = KeyWidth::Narrow;
        }
        if let Some(w) = self.workers {
            config.pipeline.workers = w;
        }
        if let Some(c) = self.queue_capacity {
            config.pipeline.queue_capacity = c;
        }
        Ok((config, self.input))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let (config, input) = Args::parse().into_config()?;
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run(&config, &input, &mut out)
        .await
        .with_context(|| format!("all-pair search over {}", input.display()))?;
    Ok(())
}
