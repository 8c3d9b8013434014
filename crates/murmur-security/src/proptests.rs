//! Property-based tests for rotation chains and the key lifecycle.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use murmur_crypto::rng::SeededRandom;
    use murmur_crypto::{EnvelopeCipher, KeyPair, KeyRotationManager, SecretKey};

    use crate::config::SecurityConfig;
    use crate::continuity::{verify_chain, ContinuityChain};
    use crate::error::SecurityError;
    use crate::lifecycle::IdentityKeyring;

    proptest! {
        // Any sequence of rotations replays to the last key, versions 1..=n.
        #[test]
        fn test_chain_replays(seed in any::<[u8; 32]>(), n in 1usize..8) {
            let rng = SeededRandom::from_seed(seed);
            let manager = KeyRotationManager::new(&rng);
            let genesis = KeyPair::generate(&rng).unwrap();

            let mut current = KeyPair::from_secret(genesis.secret_key().clone());
            let mut records = Vec::new();
            for version in 0..n as u64 {
                let (next, record) = manager
                    .rotate_key(current.secret_key(), version)
                    .unwrap()
                    .into_parts();
                prop_assert_eq!(record.version(), version + 1);
                records.push(record);
                current = next;
            }

            let head = verify_chain(genesis.public_key(), &records).unwrap();
            prop_assert_eq!(&head, current.public_key());
        }

        // Dropping any single record from the middle breaks the chain.
        #[test]
        fn test_gap_detected(seed in any::<[u8; 32]>(), n in 2usize..6, skip in any::<prop::sample::Index>()) {
            let rng = SeededRandom::from_seed(seed);
            let manager = KeyRotationManager::new(&rng);
            let genesis = KeyPair::generate(&rng).unwrap();

            let mut current = KeyPair::from_secret(genesis.secret_key().clone());
            let mut records = Vec::new();
            for version in 0..n as u64 {
                let (next, record) = manager
                    .rotate_key(current.secret_key(), version)
                    .unwrap()
                    .into_parts();
                records.push(record);
                current = next;
            }

            let i = skip.index(n - 1);
            records.remove(i);
            let result = verify_chain(genesis.public_key(), &records);
            prop_assert!(
                matches!(result, Err(SecurityError::ChainBroken { .. })),
                "expected Err(SecurityError::ChainBroken {{ .. }})"
            );
        }

        // Old-key envelopes open exactly while the grace period lasts.
        #[test]
        fn test_grace_window(
            seed in any::<[u8; 32]>(),
            rotated_at in 0u64..1_000_000,
            grace in 1u64..10_000,
            offset in 0u64..20_000,
        ) {
            let rng = SeededRandom::from_seed(seed);
            let config = SecurityConfig { grace_period_secs: grace, ..SecurityConfig::default() };
            let mut ring = IdentityKeyring::new(KeyPair::generate(&rng).unwrap(), config);
            let sender = SecretKey::generate(&rng).unwrap();

            let env = EnvelopeCipher::new(&rng).seal(&sender, ring.public_key(), "m").unwrap();
            ring.rotate(&KeyRotationManager::new(&rng), rotated_at).unwrap();

            let now = rotated_at + offset;
            let result = ring.open_envelope(&env, now);
            if offset < grace {
                prop_assert_eq!(result.unwrap(), "m");
            } else {
                prop_assert!(matches!(result, Err(SecurityError::DecryptionFailed)));
            }
        }

        #[test]
        fn test_chain_rejects_wrong_genesis(seed in any::<[u8; 32]>()) {
            let rng = SeededRandom::from_seed(seed);
            let genesis = SecretKey::generate(&rng).unwrap();
            let stranger = SecretKey::generate(&rng).unwrap();
            let record = KeyRotationManager::new(&rng)
                .rotate_key(&genesis, 0)
                .unwrap()
                .record()
                .clone();

            let mut chain = ContinuityChain::new(stranger.public_key());
            prop_assert!(chain.append(record).is_err());
            prop_assert_eq!(chain.version(), 0);
        }
    }
}
