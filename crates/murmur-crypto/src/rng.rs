//! Randomness capability.
//!
//! Every operation that needs entropy (key generation, nonces, signature
//! nonces) takes a [`RandomSource`] so tests can swap in a seeded generator
//! while production code draws from the operating system.

/// Error type for random byte generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RngError {
    #[error("secure random source unavailable")]
    Unavailable,
    #[error("rng lock is poisoned")]
    LockPoisoned,
}

/// A thread-safe source of cryptographically secure random bytes.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), RngError>;

    fn random_array<const N: usize>(&self) -> Result<[u8; N], RngError>
    where
        Self: Sized,
    {
        let mut out = [0u8; N];
        self.fill_bytes(&mut out)?;
        Ok(out)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &R {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), RngError> {
        (**self).fill_bytes(dest)
    }
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), RngError> {
        getrandom::getrandom(dest).map_err(|_| RngError::Unavailable)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use seeded::SeededRandom;

#[cfg(any(test, feature = "test-utils"))]
mod seeded {
    use std::sync::Mutex;

    use rand_chacha::rand_core::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::{RandomSource, RngError};

    /// Deterministic ChaCha20 generator. Never use outside tests.
    #[derive(Debug)]
    pub struct SeededRandom {
        rng: Mutex<ChaCha20Rng>,
    }

    impl SeededRandom {
        pub fn from_seed(seed: [u8; 32]) -> Self {
            Self {
                rng: Mutex::new(ChaCha20Rng::from_seed(seed)),
            }
        }
    }

    impl RandomSource for SeededRandom {
        fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), RngError> {
            let mut rng = self.rng.lock().map_err(|_| RngError::LockPoisoned)?;
            rng.fill_bytes(dest);
            Ok(())
        }
    }
}
