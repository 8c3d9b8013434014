//! Identity key lifecycle.
//!
//! ```text
//! Active --rotate()--> Rotating --grace period elapsed--> Retired
//! ```
//!
//! After a rotation the new key is the only one used for sealing. The
//! previous key keeps decrypting in-flight messages until its grace
//! deadline, then it is dropped (and zeroized). Rotating again before the
//! deadline retires the older key immediately.

use murmur_crypto::envelope::{self, EncryptedEnvelope, EnvelopeCipher, EnvelopeError};
use murmur_crypto::rotation::RotationExport;
use murmur_crypto::{KeyPair, KeyRotationManager, KeyRotationRecord, PublicKey, RandomSource};
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::continuity::{same_key, ContinuityChain};
use crate::error::SecurityError;

/// Lifecycle state of one key of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// Used for new envelopes and decryption.
    Active,
    /// Rotated out; still decrypts until `grace_until` (unix seconds).
    Rotating { grace_until: u64 },
    /// No longer usable.
    Retired,
}

struct PreviousKey {
    key_pair: KeyPair,
    grace_until: u64,
}

impl PreviousKey {
    fn in_grace(&self, now_unix: u64) -> bool {
        now_unix < self.grace_until
    }
}

/// The key material a party holds for its own identity.
pub struct IdentityKeyring {
    current: KeyPair,
    previous: Option<PreviousKey>,
    chain: ContinuityChain,
    config: SecurityConfig,
}

impl IdentityKeyring {
    /// A fresh identity at version 0.
    pub fn new(key_pair: KeyPair, config: SecurityConfig) -> Self {
        let chain =
            ContinuityChain::new(*key_pair.public_key()).with_max_len(config.max_chain_length);
        Self {
            current: key_pair,
            previous: None,
            chain,
            config,
        }
    }

    /// Restore a keyring from storage. `key_pair` must be the chain head.
    ///
    /// `previous` is the rotated-out key pair and its grace deadline when
    /// the identity was saved mid-rotation; it must be the old key of the
    /// chain's last record.
    pub fn resume(
        key_pair: KeyPair,
        previous: Option<(KeyPair, u64)>,
        chain: ContinuityChain,
        config: SecurityConfig,
    ) -> Result<Self, SecurityError> {
        if !same_key(chain.current_key(), key_pair.public_key()) {
            return Err(SecurityError::KeyMismatch);
        }

        let previous = match previous {
            Some((previous, grace_until)) => {
                let last_old = chain.records().last().map(|r| r.old_public_key());
                if !last_old.is_some_and(|old| same_key(old, previous.public_key())) {
                    return Err(SecurityError::KeyMismatch);
                }
                Some(PreviousKey {
                    key_pair: previous,
                    grace_until,
                })
            }
            None => None,
        };

        Ok(Self {
            current: key_pair,
            previous,
            chain: chain.with_max_len(config.max_chain_length),
            config,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        self.current.public_key()
    }

    pub fn version(&self) -> u64 {
        self.chain.version()
    }

    pub fn chain(&self) -> &ContinuityChain {
        &self.chain
    }

    /// The rotated-out key pair and its grace deadline, for persisting a
    /// keyring mid-rotation.
    pub fn previous_key(&self) -> Option<(&KeyPair, u64)> {
        self.previous
            .as_ref()
            .map(|p| (&p.key_pair, p.grace_until))
    }

    /// Replace the current key.
    ///
    /// Returns the record to publish and the export to hand to key storage.
    pub fn rotate<R: RandomSource>(
        &mut self,
        manager: &KeyRotationManager<R>,
        now_unix: u64,
    ) -> Result<(KeyRotationRecord, RotationExport), SecurityError> {
        let rotation = manager.rotate_key(self.current.secret_key(), self.chain.version())?;
        let export = rotation.export();
        let (key_pair, record) = rotation.into_parts();
        self.chain.append(record.clone())?;

        let old = std::mem::replace(&mut self.current, key_pair);
        let grace_until = now_unix.saturating_add(self.config.grace_period_secs);
        if let Some(dropped) = self.previous.replace(PreviousKey {
            key_pair: old,
            grace_until,
        }) {
            debug!(
                key = %dropped.key_pair.public_key().short_hex(),
                "retired key before end of grace period"
            );
        }

        info!(
            new = %record.new_public_key().short_hex(),
            version = record.version(),
            grace_until,
            "identity key rotated"
        );
        Ok((record, export))
    }

    /// Encrypt with the current key only.
    pub fn seal<R: RandomSource>(
        &self,
        cipher: &EnvelopeCipher<R>,
        recipient: &PublicKey,
        plaintext: &str,
    ) -> Result<EncryptedEnvelope, SecurityError> {
        Ok(cipher.seal(self.current.secret_key(), recipient, plaintext)?)
    }

    /// Decrypt a message from `sender`, trying the current key and then the
    /// previous key while it is in its grace period.
    pub fn open(
        &self,
        sender: &PublicKey,
        ciphertext: &str,
        nonce: &str,
        now_unix: u64,
    ) -> Result<String, SecurityError> {
        for key_pair in self.candidates(now_unix) {
            match envelope::open(key_pair.secret_key(), sender, ciphertext, nonce) {
                Ok(plaintext) => return Ok(plaintext),
                Err(EnvelopeError::DecryptionFailed) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        warn!(sender = %sender.short_hex(), "no candidate key decrypted envelope");
        Err(SecurityError::DecryptionFailed)
    }

    /// [`open`](Self::open) using the sender key carried in the envelope.
    pub fn open_envelope(
        &self,
        envelope: &EncryptedEnvelope,
        now_unix: u64,
    ) -> Result<String, SecurityError> {
        let sender = envelope.sender_public_key().map_err(EnvelopeError::from)?;
        self.open(&sender, envelope.cipher(), envelope.nonce(), now_unix)
    }

    /// Drop the previous key once its grace period has elapsed.
    ///
    /// Returns true if a key was retired.
    pub fn expire(&mut self, now_unix: u64) -> bool {
        match &self.previous {
            Some(previous) if !previous.in_grace(now_unix) => {
                debug!(
                    key = %previous.key_pair.public_key().short_hex(),
                    "grace period over, retiring key"
                );
                self.previous = None;
                true
            }
            _ => false,
        }
    }

    /// Overall state: `Rotating` while a previous key is still in grace.
    pub fn state(&self, now_unix: u64) -> KeyState {
        match &self.previous {
            Some(previous) if previous.in_grace(now_unix) => KeyState::Rotating {
                grace_until: previous.grace_until,
            },
            _ => KeyState::Active,
        }
    }

    /// State of a specific key, or `None` if it never belonged to this
    /// identity.
    pub fn key_state(&self, key: &PublicKey, now_unix: u64) -> Option<KeyState> {
        if same_key(key, self.current.public_key()) {
            return Some(KeyState::Active);
        }
        if let Some(previous) = &self.previous {
            if same_key(key, previous.key_pair.public_key()) && previous.in_grace(now_unix) {
                return Some(KeyState::Rotating {
                    grace_until: previous.grace_until,
                });
            }
        }
        self.chain.contains_key(key).then_some(KeyState::Retired)
    }

    fn candidates(&self, now_unix: u64) -> impl Iterator<Item = &KeyPair> {
        let previous = self
            .previous
            .as_ref()
            .filter(|p| p.in_grace(now_unix))
            .map(|p| &p.key_pair);
        std::iter::once(&self.current).chain(previous)
    }
}
