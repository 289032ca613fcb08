//! ECDSA signatures over secp256k1.
//!
//! Heartbeats, validator registrations and updates, and delegation requests
//! are all authorized by ECDSA signatures over a Keccak256 signing hash.
//!
//! ## Key Types
//!
//! - [`PrivateKey`] - 32-byte secret key for signing
//! - [`PublicKey`] - secp256k1 public key, canonically the 33-byte
//!   compressed SEC1 form on the wire
//! - [`Signature`] - 65-byte `r ‖ s ‖ v` signature
//!
//! The 20-byte [`KeyId`] identifying a validator or delegator is the last
//! 20 bytes of the Keccak256 hash of the uncompressed public key.

use crate::{keccak256, CryptoError, Result};
use k256::{
    ecdsa::{
        signature::hazmat::PrehashVerifier, RecoveryId, Signature as K256Signature, SigningKey,
        VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
    SecretKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use veristake_types::KeyId;

/// ECDSA private key (32 bytes).
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a random private key using the OS secure RNG.
    pub fn random() -> Self {
        let secret_key = SecretKey::random(&mut OsRng);
        Self {
            inner: SigningKey::from(secret_key),
        }
    }

    /// Create a private key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let secret_key = SecretKey::from_bytes(bytes.into())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self {
            inner: SigningKey::from(secret_key),
        })
    }

    /// Create a private key from a hex string (with or without `0x` prefix).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Self::from_bytes(&arr)
    }

    /// Get the raw secret bytes. Handle with care.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: *self.inner.verifying_key(),
        }
    }

    /// Shorthand for `public_key().key_id()`.
    pub fn key_id(&self) -> KeyId {
        self.public_key().key_id()
    }

    /// Sign a pre-hashed 32-byte message.
    pub fn sign_prehash(&self, hash: &[u8; 32]) -> Result<Signature> {
        let (sig, recovery_id): (K256Signature, RecoveryId) = self
            .inner
            .sign_prehash_recoverable(hash)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

        let r: [u8; 32] = sig.r().to_bytes().into();
        let s: [u8; 32] = sig.s().to_bytes().into();

        Ok(Signature {
            r,
            s,
            v: recovery_id.to_byte(),
        })
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key().to_hex())
            .finish()
    }
}

/// ECDSA public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Create a public key from SEC1 encoded bytes.
    ///
    /// Accepts the 33-byte compressed or the 65-byte uncompressed form.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        let verifying_key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self {
            inner: verifying_key,
        })
    }

    /// Create a public key from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)?;
        Self::from_sec1_bytes(&bytes)
    }

    /// The 33-byte compressed SEC1 encoding. This is the wire form.
    pub fn to_compressed(&self) -> [u8; 33] {
        let point = self.inner.to_encoded_point(true);
        let mut result = [0u8; 33];
        result.copy_from_slice(point.as_bytes());
        result
    }

    /// The 64-byte uncompressed encoding without the `0x04` prefix.
    pub fn to_uncompressed(&self) -> [u8; 64] {
        let point = self.inner.to_encoded_point(false);
        let mut result = [0u8; 64];
        result.copy_from_slice(&point.as_bytes()[1..65]);
        result
    }

    /// Hex of the compressed encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Derive the 20-byte identifier for this key.
    ///
    /// `key_id = keccak256(uncompressed_pubkey)[12..32]`
    pub fn key_id(&self) -> KeyId {
        let hash = keccak256(&self.to_uncompressed());
        let mut id = [0u8; 20];
        id.copy_from_slice(&hash[12..32]);
        KeyId::new(id)
    }

    /// Verify a signature against a pre-hashed 32-byte message.
    ///
    /// Malformed signatures verify as `false`, never as an error: a bad
    /// signature on a network message is a drop, not a fault.
    pub fn verify_prehash(&self, hash: &[u8; 32], signature: &Signature) -> bool {
        let sig = match signature.to_k256_signature() {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        self.inner.verify_prehash(hash, &sig).is_ok()
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("compressed", &self.to_hex())
            .field("key_id", &self.key_id())
            .finish()
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = self.to_compressed();
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(&bytes)
        }
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            PublicKey::from_sec1_bytes(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

/// ECDSA signature with recovery id: `r` (32) ‖ `s` (32) ‖ `v` (1).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// The r component (32 bytes)
    pub r: [u8; 32],
    /// The s component (32 bytes)
    pub s: [u8; 32],
    /// Recovery id (0 or 1)
    pub v: u8,
}

impl Signature {
    /// Create a signature from 65 raw bytes (`r ‖ s ‖ v`).
    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self { r, s, v: bytes[64] }
    }

    /// Create a signature from a byte slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 65 {
            return Err(CryptoError::InvalidLength {
                expected: 65,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 65];
        arr.copy_from_slice(bytes);
        Ok(Self::from_bytes(&arr))
    }

    /// The 65-byte encoding (`r ‖ s ‖ v`).
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Hex of the 65-byte encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    fn to_k256_signature(&self) -> Result<K256Signature> {
        let mut bytes = [0u8; 64];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        K256Signature::from_bytes((&bytes).into())
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signature")
            .field("r", &hex::encode(self.r))
            .field("s", &hex::encode(self.s))
            .field("v", &self.v)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trips() {
        let key = PrivateKey::random();
        let restored = PrivateKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key.public_key(), restored.public_key());

        let pubkey = key.public_key();
        let compressed = pubkey.to_compressed();
        let reparsed = PublicKey::from_sec1_bytes(&compressed).unwrap();
        assert_eq!(pubkey, reparsed);
    }

    #[test]
    fn test_signature_byte_round_trip() {
        let key = PrivateKey::random();
        let hash = keccak256(b"payload");
        let sig = key.sign_prehash(&hash).unwrap();

        let restored = Signature::from_bytes(&sig.to_bytes());
        assert_eq!(sig, restored);
        assert!(key.public_key().verify_prehash(&hash, &restored));
    }

    #[test]
    fn test_wrong_key_does_not_verify() {
        let signer = PrivateKey::random();
        let other = PrivateKey::random();
        let hash = keccak256(b"payload");
        let sig = signer.sign_prehash(&hash).unwrap();
        assert!(!other.public_key().verify_prehash(&hash, &sig));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let key = PrivateKey::random();
        let hash = keccak256(b"payload");
        let mut sig = key.sign_prehash(&hash).unwrap();
        sig.s[0] ^= 0x01;
        assert!(!key.public_key().verify_prehash(&hash, &sig));
    }

    #[test]
    fn test_key_id_matches_manual_derivation() {
        let key = PrivateKey::random();
        let pubkey = key.public_key();
        let hash = keccak256(&pubkey.to_uncompressed());
        assert_eq!(pubkey.key_id().as_bytes(), &hash[12..32]);
    }

    #[test]
    fn test_from_hex_rejects_bad_lengths() {
        assert!(PrivateKey::from_hex("0xabcd").is_err());
        assert!(PublicKey::from_hex("0x00").is_err());
        assert!(Signature::from_slice(&[0u8; 64]).is_err());
    }
}
