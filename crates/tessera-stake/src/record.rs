use serde::{Deserialize, Serialize};
use tessera_core::history::{Checkpoints, DayHistory};
use tessera_core::types::{Address, Amount, Day};

/// Cumulative lock and unlock totals of one account.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LockRecord {
    /// Running sum of every amount ever locked.
    pub locked: DayHistory,
    /// Running sum of every amount ever unlocked.
    pub unlocked: DayHistory,
}

impl LockRecord {
    /// Net stake held on `day`.
    pub fn net_as_of(&self, day: Day) -> Amount {
        self.locked
            .value_at(day)
            .saturating_sub(self.unlocked.value_at(day))
    }
}

/// Where an account's stake points, and how much of it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DelegationRecord {
    /// Current target; zero means staked but undelegated.
    pub validator: Address,
    /// Day of the most recent target change.
    pub changed_on: Option<Day>,
    /// Delegated amount as of each day.
    pub amount: DayHistory,
    /// Target as of each day.
    pub targets: Checkpoints<Address>,
}
