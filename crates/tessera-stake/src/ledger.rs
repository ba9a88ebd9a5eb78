use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use tessera_core::constants::{STAKE_ESCROW_TAG, UNLOCK_HOLDING_DAYS};
use tessera_core::error::TesseraError;
use tessera_core::history::DayHistory;
use tessera_core::interfaces::{StakeView, TokenLedger, ValidatorRegistry};
use tessera_core::types::{Address, Amount, Day};

use crate::record::{DelegationRecord, LockRecord};

/// What a `lock_and_delegate` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationChange {
    pub previous_validator: Address,
    pub validator: Address,
    /// Account's whole delegated amount after the call.
    pub delegated: Amount,
}

/// Day-indexed lock/unlock/delegate ledger.
///
/// Locked tokens sit in the stake escrow account. Every per-account and
/// per-validator quantity is a `DayHistory`, so snapshot reads for a day that
/// has passed are stable no matter what happens afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeLedger {
    holding_days: u64,
    escrow: Address,
    locks: BTreeMap<Address, LockRecord>,
    delegations: BTreeMap<Address, DelegationRecord>,
    validator_totals: BTreeMap<Address, DayHistory>,
}

impl Default for StakeLedger {
    fn default() -> Self {
        Self::new(UNLOCK_HOLDING_DAYS)
    }
}

impl StakeLedger {
    pub fn new(holding_days: u64) -> Self {
        Self {
            holding_days,
            escrow: Address::system(STAKE_ESCROW_TAG),
            locks: BTreeMap::new(),
            delegations: BTreeMap::new(),
            validator_totals: BTreeMap::new(),
        }
    }

    pub fn escrow(&self) -> Address {
        self.escrow
    }

    pub fn holding_days(&self) -> u64 {
        self.holding_days
    }

    /// Lock `amount` more tokens and delegate the account's entire stake to
    /// `validator`.
    ///
    /// Switching validators moves the whole balance and is allowed once per
    /// day; topping up the current validator is always allowed.
    pub fn lock_and_delegate(
        &mut self,
        account: &Address,
        amount: Amount,
        validator: &Address,
        today: Day,
        registry: &dyn ValidatorRegistry,
        tokens: &mut dyn TokenLedger,
    ) -> Result<DelegationChange, TesseraError> {
        if !validator.is_zero() {
            if !registry.is_registered(validator) {
                return Err(TesseraError::NotValidator(validator.to_string()));
            }
            if !registry.is_active(validator) {
                return Err(TesseraError::ValidatorDisabled(validator.to_string()));
            }
        }

        let current = self
            .delegations
            .get(account)
            .map(|d| (d.validator, d.changed_on))
            .unwrap_or((Address::ZERO, None));
        let changing = current.0 != *validator;
        if changing && current.1 == Some(today) {
            return Err(TesseraError::SameDayValidatorChange { day: today });
        }

        tokens.transfer(account, &self.escrow, amount)?;

        if amount > 0 {
            self.locks
                .entry(*account)
                .or_default()
                .locked
                .add_from(today, amount)?;
        }

        let record = self.delegations.entry(*account).or_default();
        let old_total = record.amount.latest();
        let new_total = old_total.checked_add(amount).ok_or(TesseraError::Overflow)?;
        if amount > 0 {
            record.amount.set_from(today, new_total)?;
        }

        if changing {
            record.validator = *validator;
            record.changed_on = Some(today);
            record.targets.set_from(today, *validator)?;
            if !current.0.is_zero() && old_total > 0 {
                self.validator_totals
                    .entry(current.0)
                    .or_default()
                    .sub_from(today, old_total)?;
            }
            if !validator.is_zero() && new_total > 0 {
                self.validator_totals
                    .entry(*validator)
                    .or_default()
                    .add_from(today, new_total)?;
            }
            info!(
                account = %account,
                from = %current.0,
                to = %validator,
                delegated = new_total,
                day = today,
                "delegation moved"
            );
        } else if !validator.is_zero() && amount > 0 {
            self.validator_totals
                .entry(*validator)
                .or_default()
                .add_from(today, amount)?;
        }

        debug!(account = %account, amount, day = today, "stake locked");
        Ok(DelegationChange {
            previous_validator: current.0,
            validator: *validator,
            delegated: new_total,
        })
    }

    /// Release `amount` of stake that has been held for the holding period.
    pub fn unlock(
        &mut self,
        account: &Address,
        amount: Amount,
        today: Day,
        tokens: &mut dyn TokenLedger,
    ) -> Result<(), TesseraError> {
        if amount == 0 {
            return Err(TesseraError::ZeroAmount);
        }
        let have = self.calc_unlockable(account, today);
        if amount > have {
            return Err(TesseraError::InsufficientUnlockable { need: amount, have });
        }

        self.locks
            .entry(*account)
            .or_default()
            .unlocked
            .add_from(today, amount)?;

        let record = self.delegations.entry(*account).or_default();
        record.amount.sub_from(today, amount)?;
        let validator = record.validator;
        if !validator.is_zero() {
            self.validator_totals
                .entry(validator)
                .or_default()
                .sub_from(today, amount)?;
        }

        tokens.transfer(&self.escrow, account, amount)?;
        info!(account = %account, amount, day = today, "stake unlocked");
        Ok(())
    }

    /// Stake locked at least `holding_days` ago and not yet unlocked.
    pub fn calc_unlockable(&self, account: &Address, today: Day) -> Amount {
        let Some(record) = self.locks.get(account) else {
            return 0;
        };
        let matured = match today.checked_sub(self.holding_days) {
            Some(day) => record.locked.value_at(day),
            None => 0,
        };
        matured.saturating_sub(record.unlocked.latest())
    }

    /// Delegators whose stake pointed at `validator` on `day`, by address.
    pub fn delegators_of(&self, day: Day, validator: &Address) -> Vec<Address> {
        self.delegations
            .iter()
            .filter(|(_, d)| d.targets.value_at(day) == *validator && d.amount.value_at(day) > 0)
            .map(|(a, _)| *a)
            .collect()
    }

    pub fn current_validator(&self, account: &Address) -> Address {
        self.delegations
            .get(account)
            .map(|d| d.validator)
            .unwrap_or_default()
    }

    pub fn lock_record(&self, account: &Address) -> Option<&LockRecord> {
        self.locks.get(account)
    }
}

impl StakeView for StakeLedger {
    fn locked_as_of(&self, day: Day, account: &Address) -> Amount {
        self.locks.get(account).map(|r| r.net_as_of(day)).unwrap_or(0)
    }

    fn delegated_total_as_of(&self, day: Day, validator: &Address) -> Amount {
        self.validator_totals
            .get(validator)
            .map(|h| h.value_at(day))
            .unwrap_or(0)
    }

    fn delegated_as_of(&self, day: Day, delegator: &Address) -> Amount {
        self.delegations
            .get(delegator)
            .map(|d| d.amount.value_at(day))
            .unwrap_or(0)
    }

    fn validator_of(&self, day: Day, delegator: &Address) -> Address {
        self.delegations
            .get(delegator)
            .map(|d| d.targets.value_at(day))
            .unwrap_or_default()
    }

    fn delegation_start(&self, delegator: &Address) -> Option<Day> {
        self.delegations.get(delegator).and_then(|d| d.amount.first_day())
    }
}
