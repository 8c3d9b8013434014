//! Security error types.

use murmur_crypto::{EnvelopeError, RotationError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("rotation chain broken: record starts at {record_old}, chain is at {current}")]
    ChainBroken { record_old: String, current: String },

    #[error("rotation version {got} does not advance past {current}")]
    VersionNotIncreasing { current: u64, got: u64 },

    #[error("invalid continuity proof: {0}")]
    InvalidContinuityProof(#[source] RotationError),

    #[error("rotation chain full: {max} records")]
    ChainFull { max: usize },

    #[error("keyring key does not match chain head")]
    KeyMismatch,

    /// No candidate key authenticated the envelope.
    #[error("decryption failed")]
    DecryptionFailed,

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("key rotation failed: {0}")]
    Rotation(#[from] RotationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
