//! Seams between the protocol core and its collaborators.
//!
//! The stake ledger, consensus engine and reward ledger only see each other
//! through `StakeView` and `OutcomeView`; the token ledger, validator registry
//! and day oracle are external and are reached through the remaining traits.

use crate::constants::{GENESIS_TIMESTAMP, SECONDS_PER_DAY};
use crate::error::TesseraError;
use crate::outcome::DayOutcome;
use crate::types::{Address, Amount, Day, LogIndex, Rate, Timestamp};

// ── Time oracle ──────────────────────────────────────────────────────────────

/// Maps wall-clock time to the monotonic day index.
pub trait DayClock {
    fn current_day(&self) -> Day;
}

/// Day oracle backed by the system clock.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    pub genesis_timestamp: Timestamp,
}

impl WallClock {
    pub fn new(genesis_timestamp: Timestamp) -> Self {
        Self { genesis_timestamp }
    }

    /// Day index containing `ts`. Anything before genesis is day 0.
    pub fn day_at(&self, ts: Timestamp) -> Day {
        if ts <= self.genesis_timestamp {
            return 0;
        }
        ((ts - self.genesis_timestamp) / SECONDS_PER_DAY) as Day
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new(GENESIS_TIMESTAMP)
    }
}

impl DayClock for WallClock {
    fn current_day(&self) -> Day {
        self.day_at(chrono::Utc::now().timestamp())
    }
}

/// A clock pinned to one day. Used by replay and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub Day);

impl DayClock for FixedClock {
    fn current_day(&self) -> Day {
        self.0
    }
}

// ── Token ledger ─────────────────────────────────────────────────────────────

pub trait TokenLedger {
    fn balance_of(&self, account: &Address) -> Amount;

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TesseraError>;
}

// ── Validator registry ───────────────────────────────────────────────────────

pub trait ValidatorRegistry {
    fn is_registered(&self, validator: &Address) -> bool;

    /// Whitelisted and currently enabled.
    fn is_active(&self, validator: &Address) -> bool;

    /// Commission in force on `day`.
    fn commission_rate(&self, validator: &Address, day: Day) -> Rate;

    fn submitter_of(&self, validator: &Address) -> Option<Address>;

    /// Resolve a transaction sender to the validator it acts for: the
    /// validator itself or its submitter proxy.
    fn validator_for_caller(&self, caller: &Address) -> Option<Address>;

    /// Every currently enabled validator, ordered by address.
    fn active_validators(&self) -> Vec<Address>;

    /// Day the validator was added to the registry.
    fn registered_on(&self, validator: &Address) -> Option<Day>;
}

// ── Stake snapshots ──────────────────────────────────────────────────────────

/// Point-in-time stake queries. Values for past days never change.
pub trait StakeView {
    fn locked_as_of(&self, day: Day, account: &Address) -> Amount;

    /// Total stake delegated to `validator` on `day`.
    fn delegated_total_as_of(&self, day: Day, validator: &Address) -> Amount;

    /// Stake `delegator` had delegated on `day`.
    fn delegated_as_of(&self, day: Day, delegator: &Address) -> Amount;

    /// Validator `delegator` pointed at on `day` (zero address if none).
    fn validator_of(&self, day: Day, delegator: &Address) -> Address;

    /// First day `delegator` held any delegated stake.
    fn delegation_start(&self, delegator: &Address) -> Option<Day>;
}

// ── Consensus outcomes ───────────────────────────────────────────────────────

pub trait OutcomeView {
    /// Outcome of `index` as observed on `today`.
    fn outcome(&self, index: LogIndex, today: Day) -> DayOutcome;

    /// Up to `limit` decided indices at or before `index`, newest first.
    fn decided_at_or_before(&self, index: LogIndex, limit: usize) -> Vec<LogIndex>;
}
