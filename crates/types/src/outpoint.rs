//! UTXO outpoint references.
//!
//! Validator self-stake and individual delegations are each locked by a
//! UTXO; the core tracks those UTXOs as [`OutPoint`]s so the engine can
//! recognize stake outputs during block validation.

use crate::{Error, Hash, Result, ZERO_HASH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to a transaction output.
///
/// The null outpoint (all-zero txid, `vout = u32::MAX`) marks a stake whose
/// locking UTXO is not known yet, e.g. a registration still under
/// construction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction id containing the output.
    pub txid: Hash,
    /// Index of the output within the transaction.
    pub vout: u32,
}

impl OutPoint {
    /// Creates an outpoint referencing `txid:vout`.
    pub const fn new(txid: Hash, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// The null outpoint.
    pub const fn null() -> Self {
        Self {
            txid: ZERO_HASH,
            vout: u32::MAX,
        }
    }

    /// Whether this is the null outpoint.
    pub fn is_null(&self) -> bool {
        self.txid == ZERO_HASH && self.vout == u32::MAX
    }
}

impl Default for OutPoint {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.txid), self.vout)
    }
}

impl fmt::Debug for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "OutPoint(null)")
        } else {
            write!(f, "OutPoint({})", self)
        }
    }
}

impl FromStr for OutPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (txid_hex, vout_str) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidOutPoint(format!("missing ':' in '{s}'")))?;
        let txid_bytes = hex::decode(txid_hex)?;
        if txid_bytes.len() != 32 {
            return Err(Error::InvalidLength {
                expected: 32,
                actual: txid_bytes.len(),
            });
        }
        let mut txid = ZERO_HASH;
        txid.copy_from_slice(&txid_bytes);
        let vout = vout_str
            .parse::<u32>()
            .map_err(|e| Error::InvalidOutPoint(format!("bad vout '{vout_str}': {e}")))?;
        Ok(Self { txid, vout })
    }
}
