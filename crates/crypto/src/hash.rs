//! Keccak256 hashing utilities.
//!
//! Every hash in the validator core is Keccak256: message signing hashes,
//! heartbeat replay ids, delegation ids, and public-key-to-id derivation.

use sha3::{Digest, Keccak256};

/// Compute the Keccak256 hash of the input data.
#[inline]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the Keccak256 hash of multiple concatenated inputs.
///
/// Equivalent to hashing the concatenation, without the temporary buffer.
#[inline]
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// A streaming Keccak256 hasher for incremental hashing.
///
/// Used where a message's signing hash is assembled field by field.
///
/// # Example
///
/// ```rust
/// use veristake_crypto::Hasher;
///
/// let mut hasher = Hasher::new();
/// hasher.update(b"field-1");
/// hasher.update(b"field-2");
/// let hash = hasher.finalize();
/// ```
#[derive(Clone, Default)]
pub struct Hasher {
    inner: Keccak256,
}

impl Hasher {
    /// Create a new Keccak256 hasher.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Keccak256::new(),
        }
    }

    /// Update the hasher with additional data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalize the hasher and return the hash, consuming it.
    #[inline]
    pub fn finalize(self) -> [u8; 32] {
        self.inner.finalize().into()
    }
}

impl std::fmt::Debug for Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_known_vectors() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            hex::encode(keccak256(b"hello")),
            "1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }

    #[test]
    fn test_concat_equivalence() {
        assert_eq!(
            keccak256(b"hello world"),
            keccak256_concat(&[b"hello", b" ", b"world"])
        );
    }

    #[test]
    fn test_streaming_matches_direct() {
        let mut hasher = Hasher::new();
        hasher.update(b"hello");
        hasher.update(b" world");
        assert_eq!(hasher.finalize(), keccak256(b"hello world"));
    }
}
