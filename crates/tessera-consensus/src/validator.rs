use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use tessera_core::constants::{COMMISSION_ACTIVATION_DELAY_DAYS, MAX_COMMISSION_RATE};
use tessera_core::error::TesseraError;
use tessera_core::history::Checkpoints;
use tessera_core::interfaces::ValidatorRegistry;
use tessera_core::types::{Address, Day, Rate};

/// Information about a single whitelisted validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub address: Address,
    /// Account allowed to submit hashes on the validator's behalf.
    pub submitter: Address,
    pub enabled: bool,
    pub registered_on: Day,
    /// Commission in force from each day on.
    pub commission: Checkpoints<Rate>,
}

/// The validator whitelist.
///
/// Validators are added by the owner and can be disabled and re-enabled.
/// Commission changes are scheduled `commission_delay` days ahead so
/// delegators can move away before a higher rate applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorSet {
    validators: BTreeMap<Address, ValidatorInfo>,
    /// submitter → validator
    submitters: BTreeMap<Address, Address>,
    commission_delay: u64,
}

impl Default for ValidatorSet {
    fn default() -> Self {
        Self::new(COMMISSION_ACTIVATION_DELAY_DAYS)
    }
}

impl ValidatorSet {
    pub fn new(commission_delay: u64) -> Self {
        Self {
            validators: BTreeMap::new(),
            submitters: BTreeMap::new(),
            commission_delay,
        }
    }

    pub fn add(
        &mut self,
        address: Address,
        submitter: Address,
        commission_rate: Rate,
        today: Day,
    ) -> Result<(), TesseraError> {
        if address.is_zero() {
            return Err(TesseraError::NotValidator(address.to_string()));
        }
        if commission_rate > MAX_COMMISSION_RATE {
            return Err(TesseraError::InvalidCommissionRate(commission_rate));
        }
        if self.validators.contains_key(&address) {
            return Err(TesseraError::ValidatorAlreadyRegistered(address.to_string()));
        }
        // A submitter may serve one validator only.
        if self.submitters.contains_key(&submitter) || self.validators.contains_key(&submitter) {
            return Err(TesseraError::ValidatorAlreadyRegistered(submitter.to_string()));
        }

        let mut commission = Checkpoints::new();
        commission.set_from(today, commission_rate)?;
        self.validators.insert(
            address,
            ValidatorInfo {
                address,
                submitter,
                enabled: true,
                registered_on: today,
                commission,
            },
        );
        if submitter != address {
            self.submitters.insert(submitter, address);
        }
        info!(validator = %address, submitter = %submitter, day = today, "validator added");
        Ok(())
    }

    pub fn set_enabled(&mut self, address: &Address, enabled: bool) -> Result<(), TesseraError> {
        let info = self
            .validators
            .get_mut(address)
            .ok_or_else(|| TesseraError::UnknownValidator(address.to_string()))?;
        match (info.enabled, enabled) {
            (false, false) => Err(TesseraError::ValidatorAlreadyDisabled(address.to_string())),
            (true, true) => Err(TesseraError::ValidatorAlreadyEnabled(address.to_string())),
            _ => {
                info.enabled = enabled;
                info!(validator = %address, enabled, "validator status changed");
                Ok(())
            }
        }
    }

    /// Schedule a new commission rate. Returns the day it takes effect.
    pub fn schedule_commission(
        &mut self,
        address: &Address,
        rate: Rate,
        today: Day,
    ) -> Result<Day, TesseraError> {
        if rate > MAX_COMMISSION_RATE {
            return Err(TesseraError::InvalidCommissionRate(rate));
        }
        let effective = today + self.commission_delay;
        let info = self
            .validators
            .get_mut(address)
            .ok_or_else(|| TesseraError::UnknownValidator(address.to_string()))?;
        info.commission.set_from(effective, rate)?;
        info!(validator = %address, rate, effective_day = effective, "commission scheduled");
        Ok(effective)
    }

    pub fn get(&self, address: &Address) -> Option<&ValidatorInfo> {
        self.validators.get(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatorInfo> {
        self.validators.values()
    }

    pub fn total_count(&self) -> usize {
        self.validators.len()
    }

    pub fn active_count(&self) -> usize {
        self.validators.values().filter(|v| v.enabled).count()
    }
}

impl ValidatorRegistry for ValidatorSet {
    fn is_registered(&self, validator: &Address) -> bool {
        self.validators.contains_key(validator)
    }

    fn is_active(&self, validator: &Address) -> bool {
        self.validators.get(validator).is_some_and(|v| v.enabled)
    }

    fn commission_rate(&self, validator: &Address, day: Day) -> Rate {
        self.validators
            .get(validator)
            .map(|v| v.commission.value_at(day))
            .unwrap_or(0)
    }

    fn submitter_of(&self, validator: &Address) -> Option<Address> {
        self.validators.get(validator).map(|v| v.submitter)
    }

    fn validator_for_caller(&self, caller: &Address) -> Option<Address> {
        if self.validators.contains_key(caller) {
            return Some(*caller);
        }
        self.submitters.get(caller).copied()
    }

    fn active_validators(&self) -> Vec<Address> {
        self.validators
            .values()
            .filter(|v| v.enabled)
            .map(|v| v.address)
            .collect()
    }

    fn registered_on(&self, validator: &Address) -> Option<Day> {
        self.validators.get(validator).map(|v| v.registered_on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::constants::RATE_PRECISION;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    #[test]
    fn submitter_resolves_to_validator() {
        let mut vs = ValidatorSet::default();
        vs.add(addr(1), addr(11), 0, 0).unwrap();
        assert_eq!(vs.validator_for_caller(&addr(1)), Some(addr(1)));
        assert_eq!(vs.validator_for_caller(&addr(11)), Some(addr(1)));
        assert_eq!(vs.validator_for_caller(&addr(12)), None);
        assert!(vs.add(addr(2), addr(11), 0, 0).is_err());
    }

    #[test]
    fn disabling_twice_fails() {
        let mut vs = ValidatorSet::default();
        vs.add(addr(1), addr(1), 0, 0).unwrap();
        vs.set_enabled(&addr(1), false).unwrap();
        assert!(!vs.is_active(&addr(1)));
        assert!(vs.is_registered(&addr(1)));
        assert!(matches!(
            vs.set_enabled(&addr(1), false),
            Err(TesseraError::ValidatorAlreadyDisabled(_))
        ));
        vs.set_enabled(&addr(1), true).unwrap();
        assert_eq!(vs.active_validators(), vec![addr(1)]);
    }

    #[test]
    fn commission_change_is_delayed() {
        let mut vs = ValidatorSet::new(7);
        vs.add(addr(1), addr(1), RATE_PRECISION / 10, 2).unwrap();
        let effective = vs.schedule_commission(&addr(1), RATE_PRECISION / 5, 10).unwrap();
        assert_eq!(effective, 17);
        assert_eq!(vs.commission_rate(&addr(1), 16), RATE_PRECISION / 10);
        assert_eq!(vs.commission_rate(&addr(1), 17), RATE_PRECISION / 5);
    }

    #[test]
    fn commission_above_one_rejected() {
        let mut vs = ValidatorSet::default();
        assert!(matches!(
            vs.add(addr(1), addr(1), RATE_PRECISION + 1, 0),
            Err(TesseraError::InvalidCommissionRate(_))
        ));
    }
}
