//! Fuzzing target for envelope decryption.
//!
//! Arbitrary ciphertext must fail closed, never panic.

#![no_main]
use libfuzzer_sys::fuzz_target;
use murmur_crypto::{codec, open, PublicKey, SecretKey};

fuzz_target!(|data: &[u8]| {
    let recipient = SecretKey::from_bytes([0x22; 32]);
    let sender = PublicKey::from_bytes([0x09; 32]);

    let (nonce, ciphertext) = data.split_at(data.len().min(24));
    let _ = open(
        &recipient,
        &sender,
        &codec::bytes_to_base64(ciphertext),
        &codec::bytes_to_base64(nonce),
    );

    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(env) = murmur_crypto::EncryptedEnvelope::from_json(json) {
            let _ = env.open(&recipient);
        }
    }
});
