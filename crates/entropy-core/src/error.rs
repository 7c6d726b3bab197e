//! Structured error taxonomy for the entropy pipeline.
//!
//! Each variant corresponds to one of the error kinds a worker can observe:
//! construction-time failures are fatal, runtime failures cost a block or a
//! dispatch and are otherwise absorbed by the worker loop.

use std::io;

/// Errors raised anywhere in the entropy pool conditioning and dispatch engine.
#[derive(Debug, thiserror::Error)]
pub enum EntropyError {
    /// Bad configuration caught before any work starts (size, threshold, hash kind).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A constructor could not allocate or initialize a structure.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// The device reader failed to produce bytes.
    #[error("device failure: {0}")]
    DeviceFailure(String),

    /// The hash primitive failed or was given invalid input.
    #[error("hash failure: {0}")]
    HashFailure(String),

    /// The secure stream failed to read or write.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// A mutex was poisoned by a panicking holder. Treated as a programmer
    /// error: the process should exit rather than continue with a pool in an
    /// unknown state.
    #[error("lock failure: {0}")]
    LockFailure(String),
}

impl EntropyError {
    /// True for kinds that cost a block or a dispatch but never the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EntropyError::DeviceFailure(_) | EntropyError::HashFailure(_) | EntropyError::NetworkFailure(_)
        )
    }
}

impl From<io::Error> for EntropyError {
    fn from(e: io::Error) -> Self {
        EntropyError::NetworkFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EntropyError>;
