//! Envelope module for peer-to-peer message encryption.
//!
//! Implements the NaCl `box` construction (X25519 + XSalsa20-Poly1305)
//! between a sender's long-term secret key and a recipient's public key.
//! Each envelope carries a fresh 24-byte random nonce.

use crypto_box::aead::{generic_array::GenericArray, Aead};
use crypto_box::SalsaBox;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{self, CodecError};
use crate::keys::{KeyError, PublicKey, SecretKey};
use crate::rng::{OsRandom, RandomSource, RngError};

/// Nonce length of XSalsa20-Poly1305.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag length, prepended to every ciphertext.
pub const TAG_SIZE: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("invalid encoding: {0}")]
    Encoding(#[from] CodecError),
    #[error("invalid key: {0}")]
    KeyFormat(#[from] KeyError),
    /// Authentication failed. Wrong key, wrong nonce, tampering and
    /// truncation all end up here.
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("nonce generation failed: {0}")]
    Rng(#[from] RngError),
}

/// Wire form of an encrypted message.
///
/// Serializes to `{"cipher": <base64>, "nonce": <base64>, "senderPk": <hex>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    cipher: String,
    nonce: String,
    #[serde(rename = "senderPk")]
    sender_pk: String,
}

impl EncryptedEnvelope {
    /// Rebuild an envelope from fields received over a transport.
    pub fn new(cipher: String, nonce: String, sender_pk: String) -> Self {
        Self {
            cipher,
            nonce,
            sender_pk,
        }
    }

    /// Base64 of the box output (tag followed by ciphertext).
    pub fn cipher(&self) -> &str {
        &self.cipher
    }

    /// Base64 of the 24-byte nonce.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Hex of the sender's public key.
    pub fn sender_pk(&self) -> &str {
        &self.sender_pk
    }

    pub fn nonce_bytes(&self) -> Result<[u8; NONCE_SIZE], CodecError> {
        codec::base64_to_array(&self.nonce)
    }

    /// Parse the embedded sender key. Small-order keys are rejected with
    /// [`KeyError::WeakKey`]: anyone can forge a box "from" them.
    pub fn sender_public_key(&self) -> Result<PublicKey, KeyError> {
        let key = PublicKey::from_hex(&self.sender_pk)?;
        if key.is_weak() {
            return Err(KeyError::WeakKey);
        }
        Ok(key)
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::InvalidJson(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        serde_json::from_str(json).map_err(|e| CodecError::InvalidJson(e.to_string()))
    }

    /// Decrypt with `recipient`, trusting the sender key carried in the
    /// envelope (small-order keys excepted, see
    /// [`sender_public_key`](Self::sender_public_key)). Callers that know
    /// who the sender should be must use [`open`] with that key instead.
    pub fn open(&self, recipient: &SecretKey) -> Result<String, EnvelopeError> {
        let sender = self.sender_public_key()?;
        open(recipient, &sender, &self.cipher, &self.nonce)
    }
}

fn salsa_box(secret: &SecretKey, public: &PublicKey) -> SalsaBox {
    let secret = crypto_box::SecretKey::from(*secret.as_bytes());
    let public = crypto_box::PublicKey::from(public.to_bytes());
    SalsaBox::new(&public, &secret)
}

/// Stateless envelope encryption over an injected randomness source.
///
/// Safe to share between threads; the only thing consumed per call is
/// entropy for the nonce.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeCipher<R = OsRandom> {
    rng: R,
}

impl<R: RandomSource> EnvelopeCipher<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Encrypt `plaintext` from raw 32-byte key material.
    ///
    /// Wrong-length keys fail with [`EnvelopeError::KeyFormat`].
    pub fn encrypt(
        &self,
        sender_private_key: &[u8],
        recipient_public_key: &[u8],
        plaintext: &str,
    ) -> Result<EncryptedEnvelope, EnvelopeError> {
        let sender = SecretKey::from_slice(sender_private_key)?;
        let recipient = PublicKey::from_slice(recipient_public_key)?;
        self.seal(&sender, &recipient, plaintext)
    }

    /// Encrypt `plaintext` (as UTF-8) from `sender` to `recipient`.
    pub fn seal(
        &self,
        sender: &SecretKey,
        recipient: &PublicKey,
        plaintext: &str,
    ) -> Result<EncryptedEnvelope, EnvelopeError> {
        let nonce: [u8; NONCE_SIZE] = self.rng.random_array()?;

        let ciphertext = salsa_box(sender, recipient)
            .encrypt(GenericArray::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| EnvelopeError::EncryptionFailed)?;

        let sender_pk = sender.public_key();
        debug!(
            sender = %sender_pk.short_hex(),
            recipient = %recipient.short_hex(),
            len = ciphertext.len(),
            "sealed envelope"
        );

        Ok(EncryptedEnvelope {
            cipher: codec::bytes_to_base64(&ciphertext),
            nonce: codec::bytes_to_base64(&nonce),
            sender_pk: sender_pk.to_hex(),
        })
    }

    pub fn decrypt(
        &self,
        recipient_private_key: &[u8],
        sender_public_key: &[u8],
        ciphertext: &str,
        nonce: &str,
    ) -> Result<String, EnvelopeError> {
        decrypt(recipient_private_key, sender_public_key, ciphertext, nonce)
    }
}

/// Decrypt from raw 32-byte key material and base64 `ciphertext`/`nonce`.
pub fn decrypt(
    recipient_private_key: &[u8],
    sender_public_key: &[u8],
    ciphertext: &str,
    nonce: &str,
) -> Result<String, EnvelopeError> {
    let recipient = SecretKey::from_slice(recipient_private_key)?;
    let sender = PublicKey::from_slice(sender_public_key)?;
    open(&recipient, &sender, ciphertext, nonce)
}

/// Decrypt a message from `sender` addressed to `recipient`.
///
/// Decoding errors are reported before any cryptography runs. Every
/// failure after that is [`EnvelopeError::DecryptionFailed`].
pub fn open(
    recipient: &SecretKey,
    sender: &PublicKey,
    ciphertext: &str,
    nonce: &str,
) -> Result<String, EnvelopeError> {
    let ciphertext = codec::base64_to_bytes(ciphertext)?;
    let nonce: [u8; NONCE_SIZE] = codec::base64_to_array(nonce)?;

    let plaintext = salsa_box(recipient, sender)
        .decrypt(GenericArray::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    debug!(sender = %sender.short_hex(), len = plaintext.len(), "opened envelope");
    Ok(codec::utf8_to_string(plaintext)?)
}
