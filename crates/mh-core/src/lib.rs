pub mod config;
pub mod error;
pub mod types;

pub use config::{LshConfig, MinhashConfig};
pub use error::{LshError, Result};
pub use types::{BandParams, KeyWidth, Signature};
