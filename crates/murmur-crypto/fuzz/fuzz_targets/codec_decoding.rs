//! Fuzzing target for hex and base64 decoding.

#![no_main]
use libfuzzer_sys::fuzz_target;
use murmur_crypto::codec;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(bytes) = codec::hex_to_bytes(s) {
            assert_eq!(codec::hex_to_bytes(&codec::bytes_to_hex(&bytes)).ok(), Some(bytes));
        }
        if let Ok(bytes) = codec::base64_to_bytes(s) {
            assert_eq!(codec::bytes_to_base64(&bytes), s);
        }
    }
});
