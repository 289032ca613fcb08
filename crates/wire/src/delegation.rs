//! Delegator-signed stake movement messages.

use crate::error::WireError;
use crate::io::{
    get_amount, get_bytes, get_height, get_var_bytes, put_amount, put_bytes, put_height,
    put_var_bytes, WireDecode, WireEncode,
};
use serde::{Deserialize, Serialize};
use veristake_crypto::{keccak256, CryptoError, PrivateKey, PublicKey, Signature};
use veristake_types::{Hash, KeyId};

/// Request to delegate stake to a validator.
///
/// Wire layout:
///
/// ```text
/// delegator_id:     [u8; 20]
/// delegator_pubkey: u16 len + bytes // 33-byte compressed SEC1
/// validator_id:     [u8; 20]
/// amount:           i64
/// height:           i32
/// signature:        u16 len + bytes
/// ```
///
/// Carries the delegator's public key so the ledger can verify this and
/// every later request from the same delegator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationRequest {
    /// The delegating key id.
    pub delegator_id: KeyId,
    /// The delegator's public key.
    pub delegator_pubkey: PublicKey,
    /// Validator receiving the delegation.
    pub validator_id: KeyId,
    /// Amount delegated, in base units.
    pub amount: u64,
    /// Height the delegation takes effect.
    pub height: u64,
    /// ECDSA signature bytes; empty while unsigned.
    pub signature: Vec<u8>,
}

impl DelegationRequest {
    /// Create an unsigned request for `key`'s owner.
    pub fn new(key: &PrivateKey, validator_id: KeyId, amount: u64, height: u64) -> Self {
        Self {
            delegator_id: key.key_id(),
            delegator_pubkey: key.public_key(),
            validator_id,
            amount,
            height,
            signature: Vec::new(),
        }
    }

    fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_bytes(&mut out, self.delegator_id.as_bytes());
        put_var_bytes(&mut out, &self.delegator_pubkey.to_compressed());
        put_bytes(&mut out, self.validator_id.as_bytes());
        put_amount(&mut out, self.amount);
        put_height(&mut out, self.height);
        out
    }

    /// The hash that is signed.
    pub fn signing_hash(&self) -> Hash {
        keccak256(&self.signing_bytes())
    }

    /// Sign with the delegator's key.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<(), CryptoError> {
        let sig = key.sign_prehash(&self.signing_hash())?;
        self.signature = sig.to_bytes().to_vec();
        Ok(())
    }

    /// Verify against the embedded public key, which must also hash to the
    /// claimed delegator id.
    pub fn verify(&self) -> bool {
        if self.delegator_pubkey.key_id() != self.delegator_id {
            return false;
        }
        match Signature::from_slice(&self.signature) {
            Ok(sig) => self
                .delegator_pubkey
                .verify_prehash(&self.signing_hash(), &sig),
            Err(_) => false,
        }
    }
}

impl WireEncode for DelegationRequest {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.signing_bytes());
        put_var_bytes(out, &self.signature);
    }
}

impl WireDecode for DelegationRequest {
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let delegator_id = KeyId::from_slice(get_bytes(input, 20)?)
            .map_err(|_| WireError::InvalidValue("delegator id"))?;
        let pubkey_bytes = get_var_bytes(input)?;
        let delegator_pubkey = PublicKey::from_sec1_bytes(pubkey_bytes)
            .map_err(|_| WireError::InvalidValue("invalid public key"))?;
        let validator_id = KeyId::from_slice(get_bytes(input, 20)?)
            .map_err(|_| WireError::InvalidValue("validator id"))?;
        let amount = get_amount(input)?;
        let height = get_height(input)?;
        let signature = get_var_bytes(input)?.to_vec();

        Ok(Self {
            delegator_id,
            delegator_pubkey,
            validator_id,
            amount,
            height,
            signature,
        })
    }
}

/// Request to begin withdrawing delegated stake.
///
/// Wire layout:
///
/// ```text
/// delegator_id: [u8; 20]
/// validator_id: [u8; 20]
/// amount:       i64  // 0 = undelegate everything
/// height:       i32
/// signature:    u16 len + bytes
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndelegationRequest {
    /// The withdrawing delegator.
    pub delegator_id: KeyId,
    /// Validator being withdrawn from.
    pub validator_id: KeyId,
    /// Amount to withdraw; 0 means all.
    pub amount: u64,
    /// Height the request takes effect.
    pub height: u64,
    /// ECDSA signature bytes; empty while unsigned.
    pub signature: Vec<u8>,
}

impl UndelegationRequest {
    /// Create an unsigned request.
    pub fn new(delegator_id: KeyId, validator_id: KeyId, amount: u64, height: u64) -> Self {
        Self {
            delegator_id,
            validator_id,
            amount,
            height,
            signature: Vec::new(),
        }
    }

    fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_bytes(&mut out, self.delegator_id.as_bytes());
        put_bytes(&mut out, self.validator_id.as_bytes());
        put_amount(&mut out, self.amount);
        put_height(&mut out, self.height);
        out
    }

    /// The hash that is signed.
    pub fn signing_hash(&self) -> Hash {
        keccak256(&self.signing_bytes())
    }

    /// Sign with the delegator's key.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<(), CryptoError> {
        let sig = key.sign_prehash(&self.signing_hash())?;
        self.signature = sig.to_bytes().to_vec();
        Ok(())
    }

    /// Verify against the delegator's public key.
    pub fn verify(&self, pubkey: &PublicKey) -> bool {
        match Signature::from_slice(&self.signature) {
            Ok(sig) => pubkey.verify_prehash(&self.signing_hash(), &sig),
            Err(_) => false,
        }
    }
}

impl WireEncode for UndelegationRequest {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.signing_bytes());
        put_var_bytes(out, &self.signature);
    }
}

impl WireDecode for UndelegationRequest {
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let delegator_id = KeyId::from_slice(get_bytes(input, 20)?)
            .map_err(|_| WireError::InvalidValue("delegator id"))?;
        let validator_id = KeyId::from_slice(get_bytes(input, 20)?)
            .map_err(|_| WireError::InvalidValue("validator id"))?;
        let amount = get_amount(input)?;
        let height = get_height(input)?;
        let signature = get_var_bytes(input)?.to_vec();

        Ok(Self {
            delegator_id,
            validator_id,
            amount,
            height,
            signature,
        })
    }
}

/// Request to sweep accumulated delegation rewards.
///
/// Wire layout:
///
/// ```text
/// delegator_id: [u8; 20]
/// validator_id: [u8; 20]  // all-zero = every validator
/// height:       i32
/// signature:    u16 len + bytes
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardClaimRequest {
    /// The claiming delegator.
    pub delegator_id: KeyId,
    /// Validator to claim from; `None` sweeps every delegation.
    pub validator_id: Option<KeyId>,
    /// Height the request takes effect.
    pub height: u64,
    /// ECDSA signature bytes; empty while unsigned.
    pub signature: Vec<u8>,
}

impl RewardClaimRequest {
    /// Create an unsigned request.
    pub fn new(delegator_id: KeyId, validator_id: Option<KeyId>, height: u64) -> Self {
        Self {
            delegator_id,
            validator_id,
            height,
            signature: Vec::new(),
        }
    }

    fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_bytes(&mut out, self.delegator_id.as_bytes());
        let validator = self.validator_id.unwrap_or(KeyId::ZERO);
        put_bytes(&mut out, validator.as_bytes());
        put_height(&mut out, self.height);
        out
    }

    /// The hash that is signed.
    pub fn signing_hash(&self) -> Hash {
        keccak256(&self.signing_bytes())
    }

    /// Sign with the delegator's key.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<(), CryptoError> {
        let sig = key.sign_prehash(&self.signing_hash())?;
        self.signature = sig.to_bytes().to_vec();
        Ok(())
    }

    /// Verify against the delegator's public key.
    pub fn verify(&self, pubkey: &PublicKey) -> bool {
        match Signature::from_slice(&self.signature) {
            Ok(sig) => pubkey.verify_prehash(&self.signing_hash(), &sig),
            Err(_) => false,
        }
    }
}

impl WireEncode for RewardClaimRequest {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.signing_bytes());
        put_var_bytes(out, &self.signature);
    }
}

impl WireDecode for RewardClaimRequest {
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let delegator_id = KeyId::from_slice(get_bytes(input, 20)?)
            .map_err(|_| WireError::InvalidValue("delegator id"))?;
        let raw_validator = KeyId::from_slice(get_bytes(input, 20)?)
            .map_err(|_| WireError::InvalidValue("validator id"))?;
        // The zero id is the "claim from everyone" sentinel
        let validator_id = (!raw_validator.is_zero()).then_some(raw_validator);
        let height = get_height(input)?;
        let signature = get_var_bytes(input)?.to_vec();

        Ok(Self {
            delegator_id,
            validator_id,
            height,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegation_round_trip_and_verify() {
        let key = PrivateKey::random();
        let validator = KeyId::new([9u8; 20]);
        let mut req = DelegationRequest::new(&key, validator, 1_000 * 100_000_000, 77);
        req.sign(&key).unwrap();

        let decoded = DelegationRequest::from_bytes(&req.to_bytes()).unwrap();
        assert_eq!(decoded, req);
        assert!(decoded.verify());
    }

    #[test]
    fn test_delegation_pubkey_must_match_id() {
        let key = PrivateKey::random();
        let mut req = DelegationRequest::new(&key, KeyId::new([9u8; 20]), 500, 1);
        // Claim a different delegator id than the embedded pubkey hashes to
        req.delegator_id = KeyId::new([1u8; 20]);
        req.sign(&key).unwrap();
        assert!(!req.verify());
    }

    #[test]
    fn test_undelegation_round_trip() {
        let key = PrivateKey::random();
        let mut req = UndelegationRequest::new(key.key_id(), KeyId::new([9u8; 20]), 0, 5);
        req.sign(&key).unwrap();

        let decoded = UndelegationRequest::from_bytes(&req.to_bytes()).unwrap();
        assert_eq!(decoded, req);
        assert!(decoded.verify(&key.public_key()));
        assert_eq!(decoded.amount, 0);
    }

    #[test]
    fn test_claim_zero_id_means_all_validators() {
        let key = PrivateKey::random();
        let mut req = RewardClaimRequest::new(key.key_id(), None, 5);
        req.sign(&key).unwrap();

        let decoded = RewardClaimRequest::from_bytes(&req.to_bytes()).unwrap();
        assert_eq!(decoded.validator_id, None);
        assert!(decoded.verify(&key.public_key()));
    }

    #[test]
    fn test_claim_named_validator_round_trip() {
        let key = PrivateKey::random();
        let validator = KeyId::new([3u8; 20]);
        let mut req = RewardClaimRequest::new(key.key_id(), Some(validator), 5);
        req.sign(&key).unwrap();

        let decoded = RewardClaimRequest::from_bytes(&req.to_bytes()).unwrap();
        assert_eq!(decoded.validator_id, Some(validator));
    }

    #[test]
    fn test_tampered_amount_fails_verification() {
        let key = PrivateKey::random();
        let mut req = UndelegationRequest::new(key.key_id(), KeyId::new([9u8; 20]), 100, 5);
        req.sign(&key).unwrap();
        req.amount = 1_000_000;
        assert!(!req.verify(&key.public_key()));
    }
}
