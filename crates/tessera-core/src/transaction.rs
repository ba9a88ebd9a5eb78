use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TesseraError;
use crate::ticket::TicketClaim;
use crate::types::{
    Address, Amount, Day, DilithiumPublicKey, DilithiumSignature, LogHash, LogIndex, Nonce, Rate,
    TxId,
};

// ── Role ──────────────────────────────────────────────────────────────────────

/// Grantable capabilities. The owner is a single address and is not a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// May supply and recycle reward pools.
    PoolMaintainer,
    /// May relay ticket redemptions on behalf of receivers.
    MetaTxWorker,
    /// May deliver randomness for pending requests.
    RandomnessOracle,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PoolMaintainer => "pool-maintainer",
            Self::MetaTxWorker => "meta-tx-worker",
            Self::RandomnessOracle => "randomness-oracle",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Action ────────────────────────────────────────────────────────────────────

/// Every state-changing operation in the protocol is one of these variants.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    // ── Tokens ───────────────────────────────────────────────────────────────
    Transfer {
        to: Address,
        amount: Amount,
    },

    // ── Stake ledger ─────────────────────────────────────────────────────────

    /// Lock `amount` more (may be 0) and point the whole stake at `validator`.
    LockAndDelegate {
        amount: Amount,
        validator: Address,
    },

    /// Release stake that has been locked for the holding period.
    Unlock {
        amount: Amount,
    },

    // ── Consensus ────────────────────────────────────────────────────────────

    /// Assert `hash` for log `index`. Sent by a validator or its submitter.
    SubmitHash {
        index: LogIndex,
        hash: LogHash,
    },

    /// Advance to the next index re-using the last submitted hash.
    CarryForward,

    /// Deliver the random value for a pending request.
    FulfillRandomness {
        request_id: u64,
        value: u128,
    },

    /// Re-issue the randomness request of a pending index (owner only).
    RetryRandomness {
        index: LogIndex,
    },

    // ── Reward pools ─────────────────────────────────────────────────────────

    /// Add `amount` to the staking pool schedule from `day` onward.
    SupplyStakingPool {
        day: Day,
        amount: Amount,
    },

    SupplyCertifiedPool {
        amount: Amount,
    },

    /// Re-inject the unclaimable emission of `source_day` at `target_day`.
    RecycleStakingPool {
        target_day: Day,
        source_day: Day,
    },

    // ── Claims ───────────────────────────────────────────────────────────────

    /// Walk at most `batch_days` days of delegator rewards.
    ClaimStakingReward {
        batch_days: u64,
    },

    /// Walk at most `batch_days` days of commission for the caller's validator.
    ClaimCommission {
        batch_days: u64,
    },

    /// Redeem delta tickets. `relayed` requires the meta-tx worker role;
    /// otherwise the sender must be the receiver of every ticket.
    RedeemTickets {
        claims: Vec<TicketClaim>,
        relayed: bool,
    },

    // ── Administration ───────────────────────────────────────────────────────
    AddValidator {
        validator: Address,
        submitter: Address,
        commission_rate: Rate,
    },

    SetValidatorEnabled {
        validator: Address,
        enabled: bool,
    },

    /// Schedule a new commission rate for the sender's validator.
    ScheduleCommission {
        rate: Rate,
    },

    GrantRole {
        role: Role,
        account: Address,
    },

    RevokeRole {
        role: Role,
        account: Address,
    },

    /// Rotate the standing ticket signer.
    SetTicketSigner {
        signer: Address,
    },
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A signed protocol transaction.
///
/// `tx_id` is BLAKE3 of the canonical bincode serialization of the body
/// (`nonce`, `from`, `action`). `from` must equal BLAKE3(`public_key`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: TxId,
    pub nonce: Nonce,
    pub from: Address,
    pub action: Action,
    pub public_key: DilithiumPublicKey,
    pub signature: DilithiumSignature,
}

/// The body bytes that are hashed to produce tx_id and covered by the signature.
#[derive(Serialize)]
pub struct TransactionBody<'a> {
    pub nonce: Nonce,
    pub from: &'a Address,
    pub action: &'a Action,
}

impl Transaction {
    pub fn body(&self) -> TransactionBody<'_> {
        TransactionBody {
            nonce: self.nonce,
            from: &self.from,
            action: &self.action,
        }
    }

    /// Serialize the body to canonical bytes (bincode).
    pub fn body_bytes(&self) -> Result<Vec<u8>, TesseraError> {
        body_bytes(self.nonce, &self.from, &self.action)
    }
}

/// Canonical body bytes for the given fields, used when building a transaction.
pub fn body_bytes(nonce: Nonce, from: &Address, action: &Action) -> Result<Vec<u8>, TesseraError> {
    bincode::serialize(&TransactionBody { nonce, from, action })
        .map_err(|e| TesseraError::Serialization(e.to_string()))
}
