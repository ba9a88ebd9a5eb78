use serde::{Deserialize, Serialize};

use tessera_consensus::{MajorityRecord, RandomnessRequest, ValidatorInfo};
use tessera_core::interfaces::ValidatorRegistry;
use tessera_core::types::{Address, Day};
use tessera_rewards::{CommissionRecord, RewardRecord, ValidationRecord};

/// Account summary returned by `tessera_getAccount`. Amounts are u128
/// base units as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcAccount {
    pub address: String,
    pub balance: String,
    pub nonce: u64,
    /// Stake currently locked.
    pub locked: String,
    pub unlockable: String,
    pub delegated: String,
    /// Current delegation target, or `None` when undelegated.
    pub validator: Option<String>,
}

/// Point-in-time stake of one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcStakeSnapshot {
    pub day: Day,
    pub locked: String,
    pub delegated: String,
    pub validator: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcValidator {
    pub address: String,
    pub submitter: String,
    pub enabled: bool,
    pub registered_on: Day,
    /// Commission in force on the current day (1e18 = 100%).
    pub commission_rate: String,
    pub delegated_total: String,
    /// Index the validator is currently voting on.
    pub pointer: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcMajority {
    pub index: u64,
    /// Hex; all zeroes when there is no majority.
    pub hash: String,
    pub majority_submitters: Vec<String>,
    pub all_submitters: Vec<String>,
    pub total_weight: String,
    pub finalized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcWinner {
    pub index: u64,
    pub winner: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcPoolInfo {
    pub day: Day,
    pub staking_balance: String,
    pub daily_reward: String,
    pub last_scheduled_day: Option<Day>,
    pub recycled: bool,
    pub certified_supplied: String,
    pub certified_available: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRandomnessRequest {
    pub index: u64,
    pub requested_day: Day,
    pub latest_request_id: u64,
    /// First day on which the request counts as abandoned.
    pub expires_on: Day,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRewardRecord {
    pub day: Day,
    pub winner: String,
    pub validator: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcCommissionRecord {
    pub day: Day,
    pub winner: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcValidationRecord {
    pub day: Day,
    pub winner: String,
    pub hash: String,
    pub daily_reward: String,
}

/// Protocol parameters and administrative addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcProtocolInfo {
    pub current_day: Day,
    pub genesis_timestamp: i64,
    pub daily_emission_rate: String,
    pub unlock_holding_days: u64,
    pub randomness_timeout_days: u64,
    pub commission_activation_delay_days: u64,
    pub owner: String,
    pub ticket_signer: String,
    pub next_unfinalized_index: u64,
    pub active_validators: usize,
}

pub(crate) fn optional_address(a: Address) -> Option<String> {
    (!a.is_zero()).then(|| a.to_b58())
}

impl RpcMajority {
    pub(crate) fn new(index: u64, m: &MajorityRecord, finalized: bool) -> Self {
        Self {
            index,
            hash: m.hash.to_hex(),
            majority_submitters: m.majority_submitters.iter().map(|(a, _)| a.to_b58()).collect(),
            all_submitters: m.all_submitters.iter().map(|a| a.to_b58()).collect(),
            total_weight: m.total_weight.to_string(),
            finalized,
        }
    }
}

impl RpcRandomnessRequest {
    pub(crate) fn new(r: &RandomnessRequest, timeout: u64) -> Self {
        Self {
            index: r.index,
            requested_day: r.requested_day,
            latest_request_id: r.latest_request_id,
            expires_on: r.requested_day.saturating_add(timeout),
        }
    }
}

impl RpcValidator {
    pub(crate) fn new(
        v: &ValidatorInfo,
        registry: &dyn ValidatorRegistry,
        today: Day,
        delegated_total: u128,
        pointer: Option<u64>,
    ) -> Self {
        Self {
            address: v.address.to_b58(),
            submitter: v.submitter.to_b58(),
            enabled: v.enabled,
            registered_on: v.registered_on,
            commission_rate: registry.commission_rate(&v.address, today).to_string(),
            delegated_total: delegated_total.to_string(),
            pointer,
        }
    }
}

impl From<RewardRecord> for RpcRewardRecord {
    fn from(r: RewardRecord) -> Self {
        Self {
            day: r.day,
            winner: r.winner.to_b58(),
            validator: r.validator.to_b58(),
            amount: r.amount.to_string(),
        }
    }
}

impl From<CommissionRecord> for RpcCommissionRecord {
    fn from(r: CommissionRecord) -> Self {
        Self {
            day: r.day,
            winner: r.winner.to_b58(),
            amount: r.amount.to_string(),
        }
    }
}

impl From<ValidationRecord> for RpcValidationRecord {
    fn from(r: ValidationRecord) -> Self {
        Self {
            day: r.day,
            winner: r.winner.to_b58(),
            hash: r.hash.to_hex(),
            daily_reward: r.daily_reward.to_string(),
        }
    }
}
