//! Identity key rotation with continuity proofs.
//!
//! A rotation replaces a peer's long-term key pair. The old secret key
//! signs the new public key together with the new version number, so
//! anyone who trusted the old public key can follow the chain to the new
//! one. Version bookkeeping belongs to the caller: it passes in the last
//! known version and persists the returned one.

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::keys::{KeyError, KeyPair, PublicKey, SecretKey};
use crate::rng::{OsRandom, RandomSource};
use crate::transcript::{tags, Transcript};
use crate::xeddsa::{ContinuitySignature, SignatureError};

/// Domain separator for rotation proofs.
pub const ROTATION_DOMAIN: &str = "murmur_rotation_v1";

/// Attempts at drawing a key that differs from the current one.
const MAX_KEYGEN_ATTEMPTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RotationError {
    #[error("invalid key: {0}")]
    KeyFormat(#[from] KeyError),
    #[error("continuity signature: {0}")]
    Signature(#[from] SignatureError),
    #[error("version counter exhausted")]
    VersionExhausted,
    #[error("random source keeps producing the current key")]
    KeyUnchanged,
}

/// Bytes signed by the old key: SHA-256 over the tagged transcript.
fn continuity_message(old: &PublicKey, new: &PublicKey, version: u64) -> [u8; 32] {
    let mut t = Transcript::new(ROTATION_DOMAIN);
    t.append_bytes(tags::OLD_KEY, old.as_bytes())
        .append_bytes(tags::NEW_KEY, new.as_bytes())
        .append_u64(tags::VERSION, version);
    t.finalize()
}

/// Signed statement that `old_public_key` hands over to `new_public_key`.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRotationRecord {
    old_public_key: PublicKey,
    new_public_key: PublicKey,
    signature: ContinuitySignature,
    version: u64,
}

impl KeyRotationRecord {
    pub fn old_public_key(&self) -> &PublicKey {
        &self.old_public_key
    }

    pub fn new_public_key(&self) -> &PublicKey {
        &self.new_public_key
    }

    pub fn signature(&self) -> &ContinuitySignature {
        &self.signature
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check the continuity proof against `old_public_key`.
    pub fn verify(&self) -> Result<(), RotationError> {
        let message = continuity_message(&self.old_public_key, &self.new_public_key, self.version);
        self.old_public_key
            .verifying_key()?
            .verify(&message, &self.signature)?;
        Ok(())
    }
}

/// Material handed to the key-storage and publication collaborators.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RotationExport {
    /// Hex, to be persisted by key storage.
    pub new_private_key: String,
    /// Hex, to be published.
    pub new_public_key: String,
    /// Base64 continuity signature.
    pub signature: String,
    #[zeroize(skip)]
    pub version: u64,
}

/// Result of a rotation: the replacement key pair and its record.
#[derive(Debug)]
pub struct Rotation {
    key_pair: KeyPair,
    record: KeyRotationRecord,
}

impl Rotation {
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn record(&self) -> &KeyRotationRecord {
        &self.record
    }

    pub fn into_parts(self) -> (KeyPair, KeyRotationRecord) {
        (self.key_pair, self.record)
    }

    pub fn export(&self) -> RotationExport {
        let (new_private_key, new_public_key) = self.key_pair.to_hex_parts();
        RotationExport {
            new_private_key,
            new_public_key,
            signature: self.record.signature.to_base64(),
            version: self.record.version,
        }
    }
}

/// Produces replacement key pairs vouched for by the current key.
#[derive(Debug, Clone, Default)]
pub struct KeyRotationManager<R = OsRandom> {
    rng: R,
}

impl<R: RandomSource> KeyRotationManager<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Rotate away from raw 32-byte key material.
    pub fn rotate(
        &self,
        current_private_key: &[u8],
        previous_version: u64,
    ) -> Result<Rotation, RotationError> {
        let current = SecretKey::from_slice(current_private_key)?;
        self.rotate_key(&current, previous_version)
    }

    /// Generate a new key pair and sign it with `current`.
    ///
    /// The record's version is `previous_version + 1`.
    pub fn rotate_key(
        &self,
        current: &SecretKey,
        previous_version: u64,
    ) -> Result<Rotation, RotationError> {
        let version = previous_version
            .checked_add(1)
            .ok_or(RotationError::VersionExhausted)?;
        let old_public_key = current.public_key();

        let mut attempts = 0;
        let key_pair = loop {
            let candidate = KeyPair::generate(&self.rng)?;
            if *candidate.public_key() != old_public_key {
                break candidate;
            }
            attempts += 1;
            if attempts >= MAX_KEYGEN_ATTEMPTS {
                return Err(RotationError::KeyUnchanged);
            }
        };
        let new_public_key = *key_pair.public_key();

        let message = continuity_message(&old_public_key, &new_public_key, version);
        let signature = current.signing_key().sign(&message, &self.rng)?;

        debug!(
            old = %old_public_key.short_hex(),
            new = %new_public_key.short_hex(),
            version,
            "rotated identity key"
        );

        Ok(Rotation {
            key_pair,
            record: KeyRotationRecord {
                old_public_key,
                new_public_key,
                signature,
                version,
            },
        })
    }
}
