#![forbid(unsafe_code)]

//! End-to-end encryption core for murmur peers.
//!
//! - [`codec`]: hex and base64 conversions for keys and ciphertext
//! - [`envelope`]: authenticated public-key encryption of single messages
//! - [`rotation`]: key replacement with a continuity proof signed by the old key
//!
//! Nothing here holds state between calls. Randomness comes from an
//! injected [`rng::RandomSource`].

pub mod codec;
pub mod rng;
pub mod keys;
pub mod transcript;
pub mod xeddsa;

pub mod envelope;
pub mod rotation;

#[cfg(test)]
mod proptests;

pub use codec::CodecError;
pub use envelope::{decrypt, open, EncryptedEnvelope, EnvelopeCipher, EnvelopeError};
pub use keys::{KeyError, KeyPair, PublicKey, SecretKey};
pub use rng::{OsRandom, RandomSource, RngError};
pub use rotation::{KeyRotationManager, KeyRotationRecord, Rotation, RotationError};
pub use xeddsa::{ContinuitySignature, SignatureError};
