use thiserror::Error;

#[derive(Error, Debug)]
pub enum LshError {
    #[error("Invalid threshold: {0} (must be in (0, 1])")]
    InvalidThreshold(f64),
    #[error("Invalid signature size: {0}")]
    InvalidSignatureSize(usize),
    #[error("Invalid error weights: false_positive={false_positive}, false_negative={false_negative}")]
    InvalidWeights { false_positive: f64, false_negative: f64 },
    #[error("No banding parameters fit signature size {0}")]
    NoBandParams(usize),
    #[error("Seed mismatch: {left} != {right}")]
    SeedMismatch { left: u64, right: u64 },
    #[error("Signature length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("Signature too short: need at least {expected} values, got {got}")]
    SignatureTooShort { expected: usize, got: usize },
    #[error("Byte length {0} is not a multiple of 8")]
    MalformedBytes(usize),
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
    #[error("Index already built, add is not permitted")]
    AlreadyIndexed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LshError>;
