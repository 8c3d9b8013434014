#![forbid(unsafe_code)]

//! Murmur security module
//!
//! Policy that sits on top of the stateless crypto core:
//! - Rotation chains: following continuity proofs from a genesis key
//! - Key lifecycle: active, rotating (grace period) and retired keys
//! - Candidate-key decryption while a rotation is in flight
//! - Configuration

pub mod config;
pub mod continuity;
pub mod error;
pub mod lifecycle;

#[cfg(test)]
mod proptests;

pub use config::SecurityConfig;
pub use continuity::{verify_chain, ContinuityChain};
pub use error::SecurityError;
pub use lifecycle::{IdentityKeyring, KeyState};
