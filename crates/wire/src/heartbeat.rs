//! The heartbeat liveness message.

use crate::error::WireError;
use crate::io::{
    get_bytes, get_height, get_i64, get_u16, get_var_bytes, put_bytes, put_height, put_i64,
    put_u16, put_var_bytes, WireDecode, WireEncode,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use veristake_crypto::{keccak256, CryptoError, PrivateKey, PublicKey, Signature};
use veristake_types::{Hash, KeyId};

/// Periodic signed liveness announcement broadcast by a validator.
///
/// Wire layout:
///
/// ```text
/// validator_id:  [u8; 20]
/// block_height:  i32
/// block_hash:    [u8; 32]
/// timestamp:     i64            // unix seconds
/// addr_str:      u16 len + bytes // "ip:port", empty when unknown
/// node_port:     u16
/// signature:     u16 len + bytes // 65-byte ECDSA, empty while unsigned
/// ```
///
/// The message id used for replay deduplication is the Keccak256 hash of
/// everything except the signature, which is also the hash the validator
/// signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Identifier of the announcing validator.
    pub validator_id: KeyId,
    /// Chain tip height from the announcer's point of view.
    pub block_height: u64,
    /// Hash of the block at `block_height`.
    pub block_hash: Hash,
    /// Unix timestamp at creation.
    pub timestamp: i64,
    /// Publicly reachable address, if the validator advertises one.
    pub node_address: Option<SocketAddr>,
    /// Listening port, kept alongside the address for peers behind proxies.
    pub node_port: u16,
    /// ECDSA signature bytes; empty while unsigned.
    pub signature: Vec<u8>,
}

impl Heartbeat {
    /// Default port advertised when the config does not override it.
    pub const DEFAULT_PORT: u16 = 18_888;

    /// Create an unsigned heartbeat without an advertised address.
    pub fn new(validator_id: KeyId, block_height: u64, block_hash: Hash, timestamp: i64) -> Self {
        Self {
            validator_id,
            block_height,
            block_hash,
            timestamp,
            node_address: None,
            node_port: Self::DEFAULT_PORT,
            signature: Vec::new(),
        }
    }

    /// Set the advertised address and matching port.
    pub fn with_address(mut self, addr: SocketAddr) -> Self {
        self.node_port = addr.port();
        self.node_address = Some(addr);
        self
    }

    fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_bytes(&mut out, self.validator_id.as_bytes());
        put_height(&mut out, self.block_height);
        put_bytes(&mut out, &self.block_hash);
        put_i64(&mut out, self.timestamp);
        let addr_str = self.address_string();
        put_var_bytes(&mut out, addr_str.as_bytes());
        put_u16(&mut out, self.node_port);
        out
    }

    /// The hash signed by the validator.
    pub fn signing_hash(&self) -> Hash {
        keccak256(&self.signing_bytes())
    }

    /// The replay-deduplication id. Identical to the signing hash.
    pub fn message_id(&self) -> Hash {
        self.signing_hash()
    }

    /// Sign with the validator's key, replacing any existing signature.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<(), CryptoError> {
        let sig = key.sign_prehash(&self.signing_hash())?;
        self.signature = sig.to_bytes().to_vec();
        Ok(())
    }

    /// Verify the signature against the registered public key.
    pub fn verify(&self, pubkey: &PublicKey) -> bool {
        match Signature::from_slice(&self.signature) {
            Ok(sig) => pubkey.verify_prehash(&self.signing_hash(), &sig),
            Err(_) => false,
        }
    }

    /// The `ip:port` string carried on the wire; empty when unknown.
    pub fn address_string(&self) -> String {
        self.node_address
            .map(|a| a.to_string())
            .unwrap_or_default()
    }
}

impl WireEncode for Heartbeat {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.signing_bytes());
        put_var_bytes(out, &self.signature);
    }
}

impl WireDecode for Heartbeat {
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let validator_id = KeyId::from_slice(get_bytes(input, 20)?)
            .map_err(|_| WireError::InvalidValue("validator id"))?;
        let block_height = get_height(input)?;

        let hash_bytes = get_bytes(input, 32)?;
        let mut block_hash = [0u8; 32];
        block_hash.copy_from_slice(hash_bytes);

        let timestamp = get_i64(input)?;

        let addr_bytes = get_var_bytes(input)?;
        let node_address = if addr_bytes.is_empty() {
            None
        } else {
            let addr_str = std::str::from_utf8(addr_bytes)
                .map_err(|_| WireError::InvalidValue("address string not utf-8"))?;
            Some(
                addr_str
                    .parse::<SocketAddr>()
                    .map_err(|_| WireError::InvalidValue("unparsable socket address"))?,
            )
        };

        let node_port = get_u16(input)?;
        let signature = get_var_bytes(input)?.to_vec();

        Ok(Self {
            validator_id,
            block_height,
            block_hash,
            timestamp,
            node_address,
            node_port,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (PrivateKey, Heartbeat) {
        let key = PrivateKey::random();
        let hb = Heartbeat::new(key.key_id(), 4200, [0x5a; 32], 1_700_000_000)
            .with_address("203.0.113.9:18888".parse().unwrap());
        (key, hb)
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let (key, mut hb) = sample();
        hb.sign(&key).unwrap();

        let decoded = Heartbeat::from_bytes(&hb.to_bytes()).unwrap();
        assert_eq!(decoded, hb);
        assert!(decoded.verify(&key.public_key()));
    }

    #[test]
    fn test_round_trip_without_address() {
        let key = PrivateKey::random();
        let mut hb = Heartbeat::new(key.key_id(), 1, [0u8; 32], 0);
        hb.sign(&key).unwrap();

        let decoded = Heartbeat::from_bytes(&hb.to_bytes()).unwrap();
        assert_eq!(decoded.node_address, None);
        assert!(decoded.verify(&key.public_key()));
    }

    #[test]
    fn test_message_id_excludes_signature() {
        let (key, mut hb) = sample();
        let unsigned_id = hb.message_id();
        hb.sign(&key).unwrap();
        assert_eq!(hb.message_id(), unsigned_id);
    }

    #[test]
    fn test_field_change_changes_id() {
        let (_, hb) = sample();
        let mut other = hb.clone();
        other.block_height += 1;
        assert_ne!(hb.message_id(), other.message_id());
    }

    #[test]
    fn test_tampered_payload_fails_verification() {
        let (key, mut hb) = sample();
        hb.sign(&key).unwrap();
        hb.timestamp += 1;
        assert!(!hb.verify(&key.public_key()));
    }

    #[test]
    fn test_unsigned_never_verifies() {
        let (key, hb) = sample();
        assert!(!hb.verify(&key.public_key()));
    }

    #[test]
    fn test_garbage_address_rejected() {
        let (key, mut hb) = sample();
        hb.sign(&key).unwrap();
        let mut bytes = hb.to_bytes();
        // Corrupt the first byte of the address string (offset: 20 id + 4
        // height + 32 hash + 8 timestamp + 2 len prefix).
        bytes[66] = 0xff;
        assert!(matches!(
            Heartbeat::from_bytes(&bytes),
            Err(WireError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let (key, mut hb) = sample();
        hb.sign(&key).unwrap();
        let mut bytes = hb.to_bytes();
        bytes.push(0);
        assert_eq!(Heartbeat::from_bytes(&bytes), Err(WireError::TrailingBytes));
    }
}
