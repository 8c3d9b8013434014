//! Rotation chains.
//!
//! A chain starts at a genesis public key that was trusted out of band and
//! accepts a rotation record only if it continues from the current head,
//! carries a higher version, and its continuity proof verifies. Records
//! are never modified or removed.

use constant_time_eq::constant_time_eq;
use murmur_crypto::{KeyRotationRecord, PublicKey};
use tracing::{debug, warn};

use crate::config::SecurityConfig;
use crate::error::SecurityError;

/// Constant-time comparison for keys checked against chain state.
pub(crate) fn same_key(a: &PublicKey, b: &PublicKey) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Append-only history of an identity's key rotations.
#[derive(Debug, Clone)]
pub struct ContinuityChain {
    genesis: PublicKey,
    genesis_version: u64,
    records: Vec<KeyRotationRecord>,
    max_len: usize,
}

impl ContinuityChain {
    /// Start a chain at `genesis` with version 0.
    pub fn new(genesis: PublicKey) -> Self {
        Self::starting_at(genesis, 0)
    }

    /// Start a chain at a key whose version is already known.
    pub fn starting_at(genesis: PublicKey, version: u64) -> Self {
        Self {
            genesis,
            genesis_version: version,
            records: Vec::new(),
            max_len: SecurityConfig::default().max_chain_length,
        }
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn genesis(&self) -> &PublicKey {
        &self.genesis
    }

    /// The key currently vouched for by the chain.
    pub fn current_key(&self) -> &PublicKey {
        self.records
            .last()
            .map(|r| r.new_public_key())
            .unwrap_or(&self.genesis)
    }

    pub fn version(&self) -> u64 {
        self.records
            .last()
            .map(|r| r.version())
            .unwrap_or(self.genesis_version)
    }

    pub fn records(&self) -> &[KeyRotationRecord] {
        &self.records
    }

    /// Whether `key` ever belonged to this identity.
    pub fn contains_key(&self, key: &PublicKey) -> bool {
        same_key(&self.genesis, key)
            || self
                .records
                .iter()
                .any(|r| same_key(r.new_public_key(), key))
    }

    /// Validate `record` against the chain head and append it.
    pub fn append(&mut self, record: KeyRotationRecord) -> Result<(), SecurityError> {
        if self.records.len() >= self.max_len {
            return Err(SecurityError::ChainFull { max: self.max_len });
        }

        let current = self.current_key();
        if !same_key(record.old_public_key(), current) {
            warn!(
                record_old = %record.old_public_key().short_hex(),
                current = %current.short_hex(),
                "rotation record does not continue the chain"
            );
            return Err(SecurityError::ChainBroken {
                record_old: record.old_public_key().to_hex(),
                current: current.to_hex(),
            });
        }

        let version = self.version();
        if record.version() <= version {
            warn!(current = version, got = record.version(), "stale rotation version");
            return Err(SecurityError::VersionNotIncreasing {
                current: version,
                got: record.version(),
            });
        }

        if let Err(e) = record.verify() {
            warn!(old = %current.short_hex(), "continuity proof rejected");
            return Err(SecurityError::InvalidContinuityProof(e));
        }

        debug!(
            new = %record.new_public_key().short_hex(),
            version = record.version(),
            "rotation appended"
        );
        self.records.push(record);
        Ok(())
    }
}

/// Replay `records` from `genesis` and return the key they end at.
pub fn verify_chain(
    genesis: &PublicKey,
    records: &[KeyRotationRecord],
) -> Result<PublicKey, SecurityError> {
    let mut chain = ContinuityChain::new(*genesis).with_max_len(records.len().max(1));
    for record in records {
        chain.append(record.clone())?;
    }
    Ok(*chain.current_key())
}
