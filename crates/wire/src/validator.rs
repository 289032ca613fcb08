//! Validator registration and update messages.

use crate::error::WireError;
use crate::io::{
    get_amount, get_bytes, get_height, get_i64, get_u8, get_var_bytes, put_amount, put_bytes,
    put_height, put_i64, put_u8, put_var_bytes, WireDecode, WireEncode,
};
use serde::{Deserialize, Serialize};
use veristake_crypto::{keccak256, CryptoError, PrivateKey, PublicKey, Signature};
use veristake_types::{Hash, KeyId};

/// Announcement of a new stake-backed validator.
///
/// Wire layout:
///
/// ```text
/// pubkey:              u16 len + bytes // 33-byte compressed SEC1
/// stake:               i64
/// pool_fee_bps:        i64
/// registration_height: i32
/// signature:           u16 len + bytes
/// ```
///
/// The registration is self-certifying: the signature is checked against
/// the embedded public key, and the validator id is derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRegistration {
    /// The validator's public key.
    pub pubkey: PublicKey,
    /// Self-stake locked behind the registration, in base units.
    pub stake_amount: u64,
    /// Pool fee in basis points (100 = 1%).
    pub pool_fee_bps: u16,
    /// Height the registration takes effect.
    pub registration_height: u64,
    /// ECDSA signature bytes; empty while unsigned.
    pub signature: Vec<u8>,
}

impl ValidatorRegistration {
    /// Create an unsigned registration.
    pub fn new(pubkey: PublicKey, stake_amount: u64, pool_fee_bps: u16, height: u64) -> Self {
        Self {
            pubkey,
            stake_amount,
            pool_fee_bps,
            registration_height: height,
            signature: Vec::new(),
        }
    }

    /// The id the validator will be registered under.
    pub fn validator_id(&self) -> KeyId {
        self.pubkey.key_id()
    }

    fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_var_bytes(&mut out, &self.pubkey.to_compressed());
        put_amount(&mut out, self.stake_amount);
        put_i64(&mut out, self.pool_fee_bps as i64);
        put_height(&mut out, self.registration_height);
        out
    }

    /// The hash that is signed.
    pub fn signing_hash(&self) -> Hash {
        keccak256(&self.signing_bytes())
    }

    /// Sign with the registering key.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<(), CryptoError> {
        let sig = key.sign_prehash(&self.signing_hash())?;
        self.signature = sig.to_bytes().to_vec();
        Ok(())
    }

    /// Verify against the embedded public key.
    pub fn verify(&self) -> bool {
        match Signature::from_slice(&self.signature) {
            Ok(sig) => self.pubkey.verify_prehash(&self.signing_hash(), &sig),
            Err(_) => false,
        }
    }
}

impl WireEncode for ValidatorRegistration {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.signing_bytes());
        put_var_bytes(out, &self.signature);
    }
}

impl WireDecode for ValidatorRegistration {
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let pubkey_bytes = get_var_bytes(input)?;
        let pubkey = PublicKey::from_sec1_bytes(pubkey_bytes)
            .map_err(|_| WireError::InvalidValue("invalid public key"))?;
        let stake_amount = get_amount(input)?;
        let fee_raw = get_i64(input)?;
        if !(0..=10_000).contains(&fee_raw) {
            return Err(WireError::InvalidValue("pool fee out of range"));
        }
        let registration_height = get_height(input)?;
        let signature = get_var_bytes(input)?.to_vec();

        Ok(Self {
            pubkey,
            stake_amount,
            pool_fee_bps: fee_raw as u16,
            registration_height,
            signature,
        })
    }
}

/// Kinds of signed validator mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum UpdateKind {
    /// Change the pool fee; `new_value` is the fee in basis points.
    UpdateFee = 1,
    /// Change the display name; `new_name` carries the value.
    UpdateName = 2,
    /// Voluntarily deactivate and begin unbonding.
    Deactivate = 3,
    /// Return to active duty from Inactive, or from Jailed once released.
    Reactivate = 4,
    /// Add `new_value` to the self-stake.
    IncreaseStake = 5,
    /// Remove `new_value` from the self-stake.
    DecreaseStake = 6,
}

impl UpdateKind {
    /// Parse the wire tag.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(UpdateKind::UpdateFee),
            2 => Some(UpdateKind::UpdateName),
            3 => Some(UpdateKind::Deactivate),
            4 => Some(UpdateKind::Reactivate),
            5 => Some(UpdateKind::IncreaseStake),
            6 => Some(UpdateKind::DecreaseStake),
            _ => None,
        }
    }
}

/// Signed mutation of an existing validator.
///
/// Wire layout:
///
/// ```text
/// validator_id:  [u8; 20]
/// kind:          u8
/// new_value:     i64            // fee or stake delta; 0 when unused
/// new_name:      u16 len + bytes // only for UpdateName
/// update_height: i32
/// signature:     u16 len + bytes
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    /// Validator being mutated.
    pub validator_id: KeyId,
    /// What is being changed.
    pub kind: UpdateKind,
    /// New fee or stake delta, depending on `kind`.
    pub new_value: i64,
    /// Replacement name for [`UpdateKind::UpdateName`].
    pub new_name: String,
    /// Height the update takes effect.
    pub update_height: u64,
    /// ECDSA signature bytes; empty while unsigned.
    pub signature: Vec<u8>,
}

impl ValidatorUpdate {
    /// Create an unsigned update carrying a numeric value.
    pub fn new(validator_id: KeyId, kind: UpdateKind, new_value: i64, height: u64) -> Self {
        Self {
            validator_id,
            kind,
            new_value,
            new_name: String::new(),
            update_height: height,
            signature: Vec::new(),
        }
    }

    /// Create an unsigned name update.
    pub fn rename(validator_id: KeyId, new_name: impl Into<String>, height: u64) -> Self {
        Self {
            validator_id,
            kind: UpdateKind::UpdateName,
            new_value: 0,
            new_name: new_name.into(),
            update_height: height,
            signature: Vec::new(),
        }
    }

    fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_bytes(&mut out, self.validator_id.as_bytes());
        put_u8(&mut out, self.kind as u8);
        put_i64(&mut out, self.new_value);
        put_var_bytes(&mut out, self.new_name.as_bytes());
        put_height(&mut out, self.update_height);
        out
    }

    /// The hash that is signed.
    pub fn signing_hash(&self) -> Hash {
        keccak256(&self.signing_bytes())
    }

    /// Sign with the validator's key.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<(), CryptoError> {
        let sig = key.sign_prehash(&self.signing_hash())?;
        self.signature = sig.to_bytes().to_vec();
        Ok(())
    }

    /// Verify against the validator's registered public key.
    pub fn verify(&self, pubkey: &PublicKey) -> bool {
        match Signature::from_slice(&self.signature) {
            Ok(sig) => pubkey.verify_prehash(&self.signing_hash(), &sig),
            Err(_) => false,
        }
    }
}

impl WireEncode for ValidatorUpdate {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.signing_bytes());
        put_var_bytes(out, &self.signature);
    }
}

impl WireDecode for ValidatorUpdate {
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let validator_id = KeyId::from_slice(get_bytes(input, 20)?)
            .map_err(|_| WireError::InvalidValue("validator id"))?;
        let kind = UpdateKind::from_u8(get_u8(input)?)
            .ok_or(WireError::InvalidValue("unknown update kind"))?;
        let new_value = get_i64(input)?;
        let name_bytes = get_var_bytes(input)?;
        let new_name = std::str::from_utf8(name_bytes)
            .map_err(|_| WireError::InvalidValue("name not utf-8"))?
            .to_string();
        let update_height = get_height(input)?;
        let signature = get_var_bytes(input)?.to_vec();

        Ok(Self {
            validator_id,
            kind,
            new_value,
            new_name,
            update_height,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_round_trip_and_verify() {
        let key = PrivateKey::random();
        let mut reg = ValidatorRegistration::new(key.public_key(), 5_000_000, 500, 12);
        reg.sign(&key).unwrap();

        let decoded = ValidatorRegistration::from_bytes(&reg.to_bytes()).unwrap();
        assert_eq!(decoded, reg);
        assert!(decoded.verify());
        assert_eq!(decoded.validator_id(), key.key_id());
    }

    #[test]
    fn test_registration_fee_bounds() {
        let key = PrivateKey::random();
        let mut reg = ValidatorRegistration::new(key.public_key(), 1, 10_000, 0);
        reg.sign(&key).unwrap();
        let mut bytes = reg.to_bytes();

        // Patch the fee field (after 2-byte len + 33-byte pubkey + 8-byte
        // stake) to 10001.
        let fee_offset = 2 + 33 + 8;
        bytes[fee_offset..fee_offset + 8].copy_from_slice(&10_001i64.to_le_bytes());
        assert!(matches!(
            ValidatorRegistration::from_bytes(&bytes),
            Err(WireError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_update_round_trip() {
        let key = PrivateKey::random();
        let mut update = ValidatorUpdate::new(key.key_id(), UpdateKind::UpdateFee, 250, 99);
        update.sign(&key).unwrap();

        let decoded = ValidatorUpdate::from_bytes(&update.to_bytes()).unwrap();
        assert_eq!(decoded, update);
        assert!(decoded.verify(&key.public_key()));
    }

    #[test]
    fn test_rename_round_trip() {
        let key = PrivateKey::random();
        let mut update = ValidatorUpdate::rename(key.key_id(), "atlas-node", 7);
        update.sign(&key).unwrap();

        let decoded = ValidatorUpdate::from_bytes(&update.to_bytes()).unwrap();
        assert_eq!(decoded.new_name, "atlas-node");
        assert!(decoded.verify(&key.public_key()));
    }

    #[test]
    fn test_unknown_update_kind_rejected() {
        let key = PrivateKey::random();
        let mut update = ValidatorUpdate::new(key.key_id(), UpdateKind::Deactivate, 0, 5);
        update.sign(&key).unwrap();
        let mut bytes = update.to_bytes();
        bytes[20] = 0x7f; // kind byte follows the 20-byte id
        assert!(matches!(
            ValidatorUpdate::from_bytes(&bytes),
            Err(WireError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_update_signed_by_other_key_rejected() {
        let key = PrivateKey::random();
        let imposter = PrivateKey::random();
        let mut update = ValidatorUpdate::new(key.key_id(), UpdateKind::IncreaseStake, 1000, 5);
        update.sign(&imposter).unwrap();
        assert!(!update.verify(&key.public_key()));
    }
}
