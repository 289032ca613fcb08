//! 20-byte key identifiers.
//!
//! This module provides the [`KeyId`] type, a 20-byte hash of a public key
//! used to identify both validators and delegators. It supports:
//!
//! - Hex encoding/decoding with optional `0x` prefix
//! - Serde serialization as hex strings (human-readable) or raw bytes (binary)
//! - Display formatting and `FromStr` parsing

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Size of a key identifier in bytes.
pub const KEY_ID_SIZE: usize = 20;

/// A 20-byte hash-of-public-key identifier.
///
/// Validators and delegators are both addressed by the hash of their public
/// key. Lookup is equality-based; the derived `Ord` exists only so that ids
/// can key ordered collections and carries no protocol meaning.
///
/// # Example
///
/// ```rust
/// use veristake_types::KeyId;
///
/// let id: KeyId = "0x742d35cc6634c0532925a3b844bc9e7595f0beb1".parse().unwrap();
/// assert_eq!(id.to_string(), "0x742d35cc6634c0532925a3b844bc9e7595f0beb1");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeyId([u8; KEY_ID_SIZE]);

impl KeyId {
    /// The all-zero identifier.
    ///
    /// The zero id never corresponds to a real key; wire formats use it as
    /// the "no validator named" sentinel.
    pub const ZERO: Self = Self([0u8; KEY_ID_SIZE]);

    /// Creates a new identifier from a 20-byte array.
    #[inline]
    pub const fn new(bytes: [u8; KEY_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates an identifier from a slice.
    ///
    /// Returns an error if the slice length is not exactly 20 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != KEY_ID_SIZE {
            return Err(Error::InvalidLength {
                expected: KEY_ID_SIZE,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; KEY_ID_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Parses an identifier from a hex string (with or without `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    /// Returns the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; KEY_ID_SIZE] {
        &self.0
    }

    /// Returns the lowercase hex encoding without a prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether this is the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; KEY_ID_SIZE]
    }
}

impl From<[u8; KEY_ID_SIZE]> for KeyId {
    fn from(bytes: [u8; KEY_ID_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<KeyId> for [u8; KEY_ID_SIZE] {
    fn from(id: KeyId) -> Self {
        id.0
    }
}

impl AsRef<[u8]> for KeyId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same hex form as Display; a raw byte-array dump is useless in logs
        write!(f, "KeyId({})", self)
    }
}

impl FromStr for KeyId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for KeyId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for KeyId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            KeyId::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            KeyId::from_slice(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let id: KeyId = "0x742d35cc6634c0532925a3b844bc9e7595f0beb1".parse().unwrap();
        assert_eq!(id.to_string(), "0x742d35cc6634c0532925a3b844bc9e7595f0beb1");

        // Prefix is optional
        let bare: KeyId = "742d35cc6634c0532925a3b844bc9e7595f0beb1".parse().unwrap();
        assert_eq!(id, bare);
    }

    #[test]
    fn test_zero_sentinel() {
        assert!(KeyId::ZERO.is_zero());
        assert!(!KeyId::new([1u8; 20]).is_zero());
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(KeyId::from_slice(&[0u8; 19]).is_err());
        assert!(KeyId::from_slice(&[0u8; 21]).is_err());
        assert!(KeyId::from_slice(&[7u8; 20]).is_ok());
    }

    #[test]
    fn test_serde_json_hex() {
        let id = KeyId::new([0xab; 20]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0xabababababababababababababababababababab\"");
        let back: KeyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
