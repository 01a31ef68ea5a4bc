//! All-pairs similarity search over a set file.
//!
//! Reads one set per line, sketches every set with MinHash, indexes the
//! signatures in an LSH index and reports every candidate pair.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod setfile;

pub use config::{AllPairConfig, PipelineConfig};
pub use output::Pair;
pub use pipeline::{run, RunSummary, SetSig, StreamStats};
pub use setfile::{SetFileError, SetRecord};

#[cfg(test)]
mod tests;
