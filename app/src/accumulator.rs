//! Incremental SHA-256 accumulator.
//!
//! The accumulator is fed the untrusted payload while the request is parsed
//! and finalized only after the user confirmed. It has its own storage and is
//! re-initialized before every use; nothing relies on state left by a
//! previous request.

use common::Hash256;
use sha2::{Digest, Sha256};

/// A resettable hash state supporting append-and-continue and
/// extract-and-reset.
pub trait IncrementalHash {
    /// Resets to the same state as a freshly created hasher.
    fn init(&mut self);

    /// Appends `data`.
    fn update(&mut self, data: &[u8]) -> &mut Self;

    /// Extracts the digest of everything fed since the last reset, then
    /// resets.
    fn finalize_reset(&mut self) -> Hash256;
}

/// SHA-256 accumulator used by the signing command.
#[derive(Clone, Debug, Default)]
pub struct DigestAccumulator {
    hasher: Sha256,
    fed: usize,
}

impl DigestAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes fed since the last reset.
    pub fn bytes_fed(&self) -> usize {
        self.fed
    }
}

impl IncrementalHash for DigestAccumulator {
    fn init(&mut self) {
        Digest::reset(&mut self.hasher);
        self.fed = 0;
    }

    fn update(&mut self, data: &[u8]) -> &mut Self {
        Digest::update(&mut self.hasher, data);
        self.fed += data.len();
        self
    }

    fn finalize_reset(&mut self) -> Hash256 {
        self.fed = 0;
        self.hasher.finalize_reset().into()
    }
}

/// `SHA256(SHA256(data))` in one go.
pub fn double_sha256(data: &[u8]) -> Hash256 {
    let first: Hash256 = Sha256::digest(data).into();
    Sha256::digest(first).into()
}
