#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::codec::{base64_to_bytes, bytes_to_base64, bytes_to_hex, hex_to_bytes, CodecError};
    use crate::envelope::{open, EnvelopeCipher, EnvelopeError, NONCE_SIZE};
    use crate::keys::SecretKey;
    use crate::rng::{OsRandom, SeededRandom};
    use crate::rotation::KeyRotationManager;

    proptest! {
        #[test]
        fn test_hex_round_trip(bytes in any::<Vec<u8>>()) {
            prop_assert_eq!(hex_to_bytes(&bytes_to_hex(&bytes)).unwrap(), bytes.clone());
            let prefixed = format!("0x{}", bytes_to_hex(&bytes));
            prop_assert_eq!(hex_to_bytes(&prefixed).unwrap(), bytes);
        }

        #[test]
        fn test_base64_round_trip(bytes in any::<Vec<u8>>()) {
            prop_assert_eq!(base64_to_bytes(&bytes_to_base64(&bytes)).unwrap(), bytes);
        }

        #[test]
        fn test_odd_length_hex_rejected(s in "[0-9a-f]{1,63}") {
            prop_assume!(s.len() % 2 == 1);
            prop_assert!(matches!(hex_to_bytes(&s), Err(CodecError::InvalidHex(_))));
        }

        #[test]
        fn test_non_hex_rejected(prefix in "([0-9a-f]{2}){0,8}", bad in "[g-zG-Z]") {
            let s = format!("{prefix}{bad}0");
            prop_assert!(matches!(hex_to_bytes(&s), Err(CodecError::InvalidHex(_))));
        }

        #[test]
        fn test_envelope_round_trip(
            sender_seed in any::<[u8; 32]>(),
            recipient_seed in any::<[u8; 32]>(),
            plaintext in any::<String>(),
        ) {
            let sender = SecretKey::from_bytes(sender_seed);
            let recipient = SecretKey::from_bytes(recipient_seed);

            let env = EnvelopeCipher::new(OsRandom)
                .seal(&sender, &recipient.public_key(), &plaintext)
                .unwrap();
            let decrypted = open(&recipient, &sender.public_key(), env.cipher(), env.nonce()).unwrap();
            prop_assert_eq!(decrypted, plaintext);
        }

        #[test]
        fn test_single_bit_tamper_detected(
            seed in any::<[u8; 32]>(),
            plaintext in ".{0,64}",
            bit in any::<prop::sample::Index>(),
            in_nonce in any::<bool>(),
        ) {
            let rng = SeededRandom::from_seed(seed);
            let sender = SecretKey::generate(&rng).unwrap();
            let recipient = SecretKey::generate(&rng).unwrap();
            let env = EnvelopeCipher::new(&rng)
                .seal(&sender, &recipient.public_key(), &plaintext)
                .unwrap();

            let mut ct = base64_to_bytes(env.cipher()).unwrap();
            let mut nonce = base64_to_bytes(env.nonce()).unwrap();
            let target = if in_nonce { &mut nonce } else { &mut ct };
            let i = bit.index(target.len() * 8);
            target[i / 8] ^= 1 << (i % 8);

            let result = open(
                &recipient,
                &sender.public_key(),
                &bytes_to_base64(&ct),
                &bytes_to_base64(&nonce),
            );
            prop_assert!(matches!(result, Err(EnvelopeError::DecryptionFailed)));
        }

        #[test]
        fn test_wrong_recipient_rejected(
            seeds in any::<([u8; 32], [u8; 32], [u8; 32])>(),
            plaintext in ".{0,64}",
        ) {
            let (sender_seed, recipient_seed, other_seed) = seeds;
            let sender = SecretKey::from_bytes(sender_seed);
            let recipient = SecretKey::from_bytes(recipient_seed);
            let other = SecretKey::from_bytes(other_seed);
            prop_assume!(other.public_key() != recipient.public_key());

            let env = EnvelopeCipher::new(OsRandom)
                .seal(&sender, &recipient.public_key(), &plaintext)
                .unwrap();
            let result = open(&other, &sender.public_key(), env.cipher(), env.nonce());
            prop_assert!(matches!(result, Err(EnvelopeError::DecryptionFailed)));
        }

        #[test]
        fn test_nonces_differ(seed in any::<[u8; 32]>(), plaintext in ".{0,32}") {
            let sender = SecretKey::from_bytes(seed);
            let recipient = sender.public_key();
            let cipher = EnvelopeCipher::new(OsRandom);

            let a = cipher.seal(&sender, &recipient, &plaintext).unwrap();
            let b = cipher.seal(&sender, &recipient, &plaintext).unwrap();
            prop_assert_eq!(a.nonce_bytes().unwrap().len(), NONCE_SIZE);
            prop_assert_ne!(a.nonce(), b.nonce());
            prop_assert_ne!(a.cipher(), b.cipher());
        }

        #[test]
        fn test_rotation_continuity(seed in any::<[u8; 32]>(), previous in 0u64..u64::MAX) {
            let rng = SeededRandom::from_seed(seed);
            let current = SecretKey::generate(&rng).unwrap();
            let rotation = KeyRotationManager::new(&rng).rotate_key(&current, previous).unwrap();

            prop_assert_ne!(rotation.key_pair().public_key(), &current.public_key());
            prop_assert_eq!(rotation.record().old_public_key(), &current.public_key());
            prop_assert_eq!(rotation.record().version(), previous + 1);
            prop_assert!(rotation.record().verify().is_ok());
        }
    }
}
