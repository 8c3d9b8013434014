//! X25519 encryption keys.
//!
//! A [`KeyPair`] is the long-term identity key of a peer. Only the
//! [`PublicKey`] half ever leaves the owning party. The secret half is
//! zeroized when dropped and never printed.

use std::fmt;

use constant_time_eq::constant_time_eq;
use curve25519_dalek::montgomery::MontgomeryPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec::{self, CodecError};
use crate::rng::{RandomSource, RngError};
use crate::xeddsa::{SignatureError, SigningKey, VerifyingKey};

/// Length of public and secret keys in bytes.
pub const KEY_SIZE: usize = 32;

/// Error type for key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid key encoding: {0}")]
    Encoding(#[from] CodecError),
    #[error("key generation failed: {0}")]
    Rng(#[from] RngError),
    #[error("public key is of small order")]
    WeakKey,
}

fn key_array(bytes: &[u8]) -> Result<[u8; KEY_SIZE], KeyError> {
    bytes.try_into().map_err(|_| KeyError::InvalidLength {
        expected: KEY_SIZE,
        got: bytes.len(),
    })
}

/// X25519 secret key used for envelope encryption.
///
/// Every 32-byte value is accepted; clamping happens inside the curve
/// operations.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        key_array(bytes).map(Self)
    }

    /// Parse a hex encoded secret key, `0x` prefix optional.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        Self::from_slice(&codec::hex_to_bytes(hex)?)
    }

    pub fn generate(rng: &impl RandomSource) -> Result<Self, KeyError> {
        Ok(Self(rng.random_array()?))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        codec::bytes_to_hex(&self.0)
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        let secret = StaticSecret::from(self.0);
        PublicKey(X25519PublicKey::from(&secret).to_bytes())
    }

    /// The signing capability of this key, used for continuity proofs.
    pub fn signing_key(&self) -> SigningKey {
        SigningKey::from_secret(self)
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey").field("value", &"***").finish()
    }
}

/// X25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; KEY_SIZE]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        key_array(bytes).map(Self)
    }

    /// Parse a hex encoded public key, `0x` prefix optional.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        Self::from_slice(&codec::hex_to_bytes(hex)?)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; KEY_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        codec::bytes_to_hex(&self.0)
    }

    /// Short hex prefix for log output.
    pub fn short_hex(&self) -> String {
        codec::bytes_to_hex(&self.0[..8])
    }

    /// True for keys of small order, and for values that are not points on
    /// the curve. A box between such a key and any secret has a publicly
    /// computable shared key.
    pub fn is_weak(&self) -> bool {
        MontgomeryPoint(self.0)
            .to_edwards(0)
            .map_or(true, |point| point.is_small_order())
    }

    /// Verifying key for continuity proofs issued by the holder of the
    /// matching secret key.
    pub fn verifying_key(&self) -> Result<VerifyingKey, SignatureError> {
        VerifyingKey::from_public_key(self)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        PublicKey::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// A secret key together with its derived public key.
pub struct KeyPair {
    public_key: PublicKey,
    secret_key: SecretKey,
}

impl KeyPair {
    /// Generate a fresh key pair. Identity creation and key rotation both
    /// go through here.
    pub fn generate(rng: &impl RandomSource) -> Result<Self, KeyError> {
        Ok(Self::from_secret(SecretKey::generate(rng)?))
    }

    pub fn from_secret(secret_key: SecretKey) -> Self {
        Self {
            public_key: secret_key.public_key(),
            secret_key,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// `(secret_hex, public_hex)` for hand-off to key storage and publication.
    pub fn to_hex_parts(&self) -> (String, String) {
        (self.secret_key.to_hex(), self.public_key.to_hex())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &self.secret_key)
            .finish()
    }
}
