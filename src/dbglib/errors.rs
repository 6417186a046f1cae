use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbgError {
    /// A read that can't contribute k-mers. Never fatal on its own
    #[error("malformed read: {0}")]
    MalformedRead(String),

    #[error("invalid kmer size {k}: {reason}")]
    InvalidK { k: usize, reason: String },

    #[error("no usable reads ({total} read, {skipped} skipped)")]
    EmptyInput { total: u64, skipped: u64 },

    #[error("graph simplification did not converge after {0} rounds")]
    NonConvergence(usize),

    #[error("malformed input at record {record}: {msg}")]
    MalformedInput { record: usize, msg: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
