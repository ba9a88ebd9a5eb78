use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount in base units (18 decimal places). u128 covers far more than
/// any realistic supply; products that can exceed it go through `math::mul_div`.
pub type Amount = u128;

/// Discrete protocol time unit. All ledger state is keyed by it.
pub type Day = u64;

/// Consensus log index. One index per day.
pub type LogIndex = u64;

/// Fixed-point rate scaled by `RATE_PRECISION` (1e18 == 100%).
pub type Rate = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Transaction sequence number per account (monotonically increasing).
pub type Nonce = u64;

// ── Address ──────────────────────────────────────────────────────────────────

/// 32-byte account identifier derived as BLAKE3(dilithium_public_key).
///
/// The all-zero address is reserved: as a delegation target it means
/// "staked but undelegated".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Deterministic address for a protocol-owned account (escrows).
    /// No key hashes to it, so nothing can sign for it.
    pub fn system(tag: &str) -> Self {
        let mut h = blake3::Hasher::new();
        h.update(b"tessera/system/");
        h.update(tag.as_bytes());
        Self(*h.finalize().as_bytes())
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, bs58::decode::Error> {
        let bytes = bs58::decode(s).into_vec()?;
        if bytes.len() != 32 {
            return Err(bs58::decode::Error::BufferTooSmall);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.to_b58();
        write!(f, "Address({})", &s[..s.len().min(8)])
    }
}

// ── LogHash ──────────────────────────────────────────────────────────────────

/// Content hash of the shared append-only log at some index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogHash(pub [u8; 32]);

impl LogHash {
    /// Returned as the majority hash when there is none.
    pub const EMPTY: LogHash = LogHash([0u8; 32]);

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for LogHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for LogHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogHash({}…)", &self.to_hex()[..12])
    }
}

// ── TxId ─────────────────────────────────────────────────────────────────────

/// 32-byte transaction identifier: BLAKE3 of the canonical serialized tx body.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..16])
    }
}

// ── Dilithium wrappers ───────────────────────────────────────────────────────

/// Dilithium2 public key (1312 bytes per NIST FIPS 204).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumPublicKey(pub Vec<u8>);

impl fmt::Debug for DilithiumPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DilithiumPublicKey({}b)", self.0.len())
    }
}

/// Dilithium2 signature (2420 bytes per NIST FIPS 204).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumSignature(pub Vec<u8>);

impl fmt::Debug for DilithiumSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DilithiumSignature({}b)", self.0.len())
    }
}

/// A detached signature bundled with the key that produced it.
///
/// Dilithium has no public-key recovery, so the signer's key travels with the
/// signature and the signer address is recovered as BLAKE3(public_key) after
/// the signature checks out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    pub public_key: DilithiumPublicKey,
    pub signature: DilithiumSignature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_b58_round_trip() {
        let a = Address::from_bytes([7u8; 32]);
        assert_eq!(Address::from_b58(&a.to_b58()).unwrap(), a);
    }

    #[test]
    fn system_addresses_are_distinct_and_nonzero() {
        let a = Address::system("stake-escrow");
        let b = Address::system("staking-pool");
        assert_ne!(a, b);
        assert!(!a.is_zero());
    }

    #[test]
    fn log_hash_rejects_short_hex() {
        assert!(LogHash::from_hex("abcd").is_err());
    }
}
