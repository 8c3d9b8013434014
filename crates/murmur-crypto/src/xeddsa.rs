//! Continuity signatures over X25519 identity keys.
//!
//! Rotation proofs are XEdDSA signatures: Ed25519-compatible signatures
//! computed with an X25519 secret key and verified against the X25519
//! public key, so a peer's published encryption key is enough to check a
//! rotation without a second signing key being distributed.
//!
//! <https://signal.org/docs/specifications/xeddsa/>

use std::fmt;

use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::{clamp_integer, Scalar};
use curve25519_dalek::EdwardsPoint;
use ed25519_dalek::{Signature, VerifyingKey as Ed25519VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec::{self, CodecError};
use crate::keys::{PublicKey, SecretKey};
use crate::rng::{RandomSource, RngError};

/// Length of a signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// hash1 prefix: 0xFE followed by 31 bytes of 0xFF.
const HASH_1_PREFIX: [u8; 32] = [
    0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// Error type for signing and verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("public key cannot verify signatures")]
    InvalidPublicKey,
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("invalid signature encoding: {0}")]
    Encoding(#[from] CodecError),
    #[error("signing failed: {0}")]
    Rng(#[from] RngError),
}

fn sha2_512(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Detached 64-byte signature, `R || s`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ContinuitySignature([u8; SIGNATURE_SIZE]);

impl ContinuitySignature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        codec::bytes_to_base64(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, SignatureError> {
        Ok(Self(codec::base64_to_array(encoded)?))
    }
}

impl fmt::Debug for ContinuitySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContinuitySignature")
            .field(&self.to_base64())
            .finish()
    }
}

impl Serialize for ContinuitySignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for ContinuitySignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        ContinuitySignature::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Signing capability of an X25519 secret key.
///
/// Obtained through [`SecretKey::signing_key`]; it cannot be used to
/// encrypt.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SigningKey {
    clamped: [u8; 32],
}

impl SigningKey {
    pub(crate) fn from_secret(secret: &SecretKey) -> Self {
        Self {
            clamped: clamp_integer(*secret.as_bytes()),
        }
    }

    /// Sign `message`. XEdDSA draws 64 bytes of fresh randomness per
    /// signature.
    pub fn sign(
        &self,
        message: &[u8],
        rng: &impl RandomSource,
    ) -> Result<ContinuitySignature, SignatureError> {
        let z: [u8; 64] = rng.random_array()?;

        // Edwards key pair with the sign bit of A forced to zero.
        let mut k = Scalar::from_bytes_mod_order(self.clamped);
        let mut cap_a = EdwardsPoint::mul_base(&k).compress().to_bytes();
        let sign_bit = cap_a[31] >> 7;
        cap_a[31] &= 0b0111_1111;
        let mut a = if sign_bit == 1 { -k } else { k };

        let mut r = Scalar::from_bytes_mod_order_wide(&sha2_512(&[
            &HASH_1_PREFIX,
            a.as_bytes(),
            message,
            &z,
        ]));
        let cap_r = EdwardsPoint::mul_base(&r).compress();
        let h = Scalar::from_bytes_mod_order_wide(&sha2_512(&[
            cap_r.as_bytes(),
            &cap_a,
            message,
        ]));
        let s = r + h * a;

        k.zeroize();
        a.zeroize();
        r.zeroize();

        let mut out = [0u8; SIGNATURE_SIZE];
        out[..32].copy_from_slice(cap_r.as_bytes());
        out[32..].copy_from_slice(s.as_bytes());
        Ok(ContinuitySignature(out))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").field("value", &"***").finish()
    }
}

/// Verification side of a continuity signature, derived from an X25519
/// public key.
#[derive(Clone, Copy, Debug)]
pub struct VerifyingKey {
    public_key: PublicKey,
    edwards: Ed25519VerifyingKey,
}

impl VerifyingKey {
    pub(crate) fn from_public_key(public_key: &PublicKey) -> Result<Self, SignatureError> {
        let point = MontgomeryPoint(public_key.to_bytes())
            .to_edwards(0)
            .ok_or(SignatureError::InvalidPublicKey)?;
        let edwards = Ed25519VerifyingKey::from_bytes(point.compress().as_bytes())
            .map_err(|_| SignatureError::InvalidPublicKey)?;
        if edwards.is_weak() {
            return Err(SignatureError::InvalidPublicKey);
        }
        Ok(Self {
            public_key: *public_key,
            edwards,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Strict Ed25519 verification against the Edwards form of the key.
    pub fn verify(
        &self,
        message: &[u8],
        signature: &ContinuitySignature,
    ) -> Result<(), SignatureError> {
        let signature = Signature::from_bytes(signature.as_bytes());
        self.edwards
            .verify_strict(message, &signature)
            .map_err(|_| SignatureError::VerificationFailed)
    }
}
