use serde::{Deserialize, Serialize};

use tessera_core::types::{Address, Amount, Day, LogHash};

/// A decided day as seen by a delegator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub day: Day,
    pub winner: Address,
    /// Validator the delegator backed that day.
    pub validator: Address,
    pub amount: Amount,
}

/// A decided day as seen by a validator collecting commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub day: Day,
    pub winner: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub day: Day,
    pub winner: Address,
    pub hash: LogHash,
    pub daily_reward: Amount,
}
