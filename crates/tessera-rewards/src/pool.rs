//! Reward pools.
//!
//! The staking pool is a decaying schedule. Each supply lands on a future day
//! and from then on the balance loses a fixed fraction per day:
//!
//! ```text
//!   daily(d)     = balance(d) * rate
//!   balance(d+1) = balance(d) - daily(d) + supply(d+1)
//! ```
//!
//! Only the balance on each supply day is stored. Any later day is reached by
//! stepping the recurrence forward from the closest anchor at or before it,
//! and since supplies may only be scheduled after every existing one, no
//! anchor is ever rewritten.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use tessera_core::constants::{CERTIFIED_POOL_TAG, DEFAULT_DAILY_EMISSION_RATE, RATE_PRECISION, STAKING_POOL_TAG};
use tessera_core::error::TesseraError;
use tessera_core::interfaces::TokenLedger;
use tessera_core::math::apply_rate;
use tessera_core::types::{Address, Amount, Day, Rate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingPool {
    emission_rate: Rate,
    escrow: Address,
    /// Balance on each supply day, supply included.
    anchors: BTreeMap<Day, Amount>,
    /// Amount injected on each supply day.
    supplies: BTreeMap<Day, Amount>,
    recycled: BTreeSet<Day>,
}

impl Default for StakingPool {
    fn default() -> Self {
        Self {
            emission_rate: DEFAULT_DAILY_EMISSION_RATE,
            escrow: Address::system(STAKING_POOL_TAG),
            anchors: BTreeMap::new(),
            supplies: BTreeMap::new(),
            recycled: BTreeSet::new(),
        }
    }
}

impl StakingPool {
    pub fn new(emission_rate: Rate) -> Result<Self, TesseraError> {
        if emission_rate == 0 || emission_rate >= RATE_PRECISION {
            return Err(TesseraError::InvalidEmissionRate(emission_rate));
        }
        Ok(Self {
            emission_rate,
            ..Self::default()
        })
    }

    pub fn escrow(&self) -> Address {
        self.escrow
    }

    pub fn emission_rate(&self) -> Rate {
        self.emission_rate
    }

    pub fn last_scheduled_day(&self) -> Option<Day> {
        self.anchors.keys().next_back().copied()
    }

    pub fn supplies(&self) -> &BTreeMap<Day, Amount> {
        &self.supplies
    }

    pub fn is_recycled(&self, day: Day) -> bool {
        self.recycled.contains(&day)
    }

    fn check_schedulable(&self, day: Day, today: Day) -> Result<(), TesseraError> {
        if day <= today {
            return Err(TesseraError::DayNotInFuture { day, today });
        }
        if let Some(latest) = self.last_scheduled_day() {
            if day <= latest {
                return Err(TesseraError::SupplyBeforeScheduled { day, latest });
            }
        }
        Ok(())
    }

    fn schedule(&mut self, day: Day, amount: Amount) -> Result<Amount, TesseraError> {
        let carried = match self.anchors.range(..day).next_back() {
            Some((&anchor_day, &anchor)) => self.step(anchor, day - anchor_day),
            None => 0,
        };
        let balance = carried.checked_add(amount).ok_or(TesseraError::Overflow)?;
        self.anchors.insert(day, balance);
        *self.supplies.entry(day).or_default() += amount;
        Ok(balance)
    }

    fn step(&self, mut balance: Amount, days: u64) -> Amount {
        for _ in 0..days {
            if balance == 0 {
                break;
            }
            balance -= apply_rate(balance, self.emission_rate);
        }
        balance
    }

    /// Move `amount` from `funder` into the pool escrow and schedule it for
    /// `day`.
    pub fn supply(
        &mut self,
        funder: &Address,
        day: Day,
        amount: Amount,
        today: Day,
        tokens: &mut dyn TokenLedger,
    ) -> Result<Amount, TesseraError> {
        if amount == 0 {
            return Err(TesseraError::ZeroAmount);
        }
        self.check_schedulable(day, today)?;
        tokens.transfer(funder, &self.escrow, amount)?;
        let balance = self.schedule(day, amount)?;
        info!(funder = %funder, day, amount, balance, "staking pool supplied");
        Ok(balance)
    }

    /// Re-inject the unclaimable emission of `source_day` on `target_day`.
    ///
    /// The caller is responsible for checking that nobody can claim the
    /// source day. The tokens never left the escrow, so nothing moves.
    pub fn recycle(&mut self, target_day: Day, source_day: Day, today: Day) -> Result<Amount, TesseraError> {
        if self.recycled.contains(&source_day) {
            return Err(TesseraError::AlreadyRecycled(source_day));
        }
        self.check_schedulable(target_day, today)?;
        let amount = self.daily_reward(source_day);
        if amount == 0 {
            return Err(TesseraError::ZeroAmount);
        }
        self.schedule(target_day, amount)?;
        self.recycled.insert(source_day);
        info!(source_day, target_day, amount, "staking pool recycled");
        Ok(amount)
    }

    /// Pool balance on `day`, before that day's emission.
    pub fn balance_at(&self, day: Day) -> Amount {
        match self.anchors.range(..=day).next_back() {
            Some((&anchor_day, &anchor)) => self.step(anchor, day - anchor_day),
            None => 0,
        }
    }

    pub fn daily_reward(&self, day: Day) -> Amount {
        apply_rate(self.balance_at(day), self.emission_rate)
    }

    /// `(day, daily_reward)` for consecutive days starting at `from`.
    pub fn emissions(&self, from: Day) -> Emissions<'_> {
        Emissions {
            pool: self,
            day: from,
            balance: self.balance_at(from),
        }
    }
}

/// Walks the schedule one day at a time without re-deriving each balance.
pub struct Emissions<'a> {
    pool: &'a StakingPool,
    day: Day,
    balance: Amount,
}

impl Iterator for Emissions<'_> {
    type Item = (Day, Amount);

    fn next(&mut self) -> Option<Self::Item> {
        let day = self.day;
        let daily = apply_rate(self.balance, self.pool.emission_rate);
        self.day = day.checked_add(1)?;
        self.balance = self.balance - daily + self.pool.supplies.get(&self.day).copied().unwrap_or(0);
        Some((day, daily))
    }
}

/// Pool for externally-certified rewards. Only ever grows; tickets draw on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertifiedPool {
    escrow: Address,
    total_supplied: Amount,
    total_paid: Amount,
}

impl Default for CertifiedPool {
    fn default() -> Self {
        Self {
            escrow: Address::system(CERTIFIED_POOL_TAG),
            total_supplied: 0,
            total_paid: 0,
        }
    }
}

impl CertifiedPool {
    pub fn escrow(&self) -> Address {
        self.escrow
    }

    pub fn total_supplied(&self) -> Amount {
        self.total_supplied
    }

    pub fn total_paid(&self) -> Amount {
        self.total_paid
    }

    pub fn available(&self) -> Amount {
        self.total_supplied - self.total_paid
    }

    pub fn supply(
        &mut self,
        funder: &Address,
        amount: Amount,
        tokens: &mut dyn TokenLedger,
    ) -> Result<Amount, TesseraError> {
        if amount == 0 {
            return Err(TesseraError::ZeroAmount);
        }
        tokens.transfer(funder, &self.escrow, amount)?;
        self.total_supplied = self
            .total_supplied
            .checked_add(amount)
            .ok_or(TesseraError::Overflow)?;
        info!(funder = %funder, amount, total = self.total_supplied, "certified pool supplied");
        Ok(self.total_supplied)
    }

    /// Pay `amount` to `to`, bounded by what was supplied.
    pub fn pay(&mut self, to: &Address, amount: Amount, tokens: &mut dyn TokenLedger) -> Result<(), TesseraError> {
        let available = self.available();
        if amount > available {
            return Err(TesseraError::PoolBudgetExceeded { need: amount, available });
        }
        tokens.transfer(&self.escrow, to, amount)?;
        self.total_paid += amount;
        Ok(())
    }
}
