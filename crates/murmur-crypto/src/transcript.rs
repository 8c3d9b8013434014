//! Canonical byte strings for signing.
//!
//! Fields are appended as `(tag, len, bytes)` so the same logical record
//! always produces the same signing input.

use bytes::{BufMut, BytesMut};
use sha2::{Digest, Sha256};

/// Tags for transcript fields.
pub mod tags {
    pub const DOMAIN: u32 = 0;
    pub const OLD_KEY: u32 = 1;
    pub const NEW_KEY: u32 = 2;
    pub const VERSION: u32 = 3;
}

#[derive(Clone, Debug)]
pub struct Transcript {
    buf: BytesMut,
}

impl Transcript {
    /// Create a new transcript with the given domain separator.
    pub fn new(domain: &'static str) -> Self {
        let mut t = Self {
            buf: BytesMut::with_capacity(128),
        };
        t.append_bytes(tags::DOMAIN, domain.as_bytes());
        t
    }

    pub fn append_bytes(&mut self, tag: u32, data: &[u8]) -> &mut Self {
        self.buf.put_u32(tag);
        self.buf.put_u32(data.len() as u32);
        self.buf.extend_from_slice(data);
        self
    }

    pub fn append_u64(&mut self, tag: u32, v: u64) -> &mut Self {
        self.buf.put_u32(tag);
        self.buf.put_u32(8);
        self.buf.put_u64(v);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// SHA-256 of the transcript contents.
    pub fn finalize(&self) -> [u8; 32] {
        let digest = Sha256::digest(&self.buf);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }
}
