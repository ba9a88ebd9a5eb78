use serde::{Deserialize, Serialize};

use tessera_core::constants::{
    COMMISSION_ACTIVATION_DELAY_DAYS, DEFAULT_DAILY_EMISSION_RATE, GENESIS_TIMESTAMP,
    RANDOMNESS_TIMEOUT_DAYS, RATE_PRECISION, UNLOCK_HOLDING_DAYS,
};
use tessera_core::error::TesseraError;
use tessera_core::interfaces::WallClock;
use tessera_core::types::{Rate, Timestamp};

/// Protocol parameters fixed at genesis.
///
/// Missing fields in a genesis file fall back to the protocol defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Fraction of the staking pool balance emitted per day.
    pub daily_emission_rate: Rate,
    pub unlock_holding_days: u64,
    pub randomness_timeout_days: u64,
    pub commission_activation_delay_days: u64,
    /// Unix time at which day 0 begins.
    pub genesis_timestamp: Timestamp,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            daily_emission_rate: DEFAULT_DAILY_EMISSION_RATE,
            unlock_holding_days: UNLOCK_HOLDING_DAYS,
            randomness_timeout_days: RANDOMNESS_TIMEOUT_DAYS,
            commission_activation_delay_days: COMMISSION_ACTIVATION_DELAY_DAYS,
            genesis_timestamp: GENESIS_TIMESTAMP,
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<(), TesseraError> {
        if self.daily_emission_rate == 0 || self.daily_emission_rate >= RATE_PRECISION {
            return Err(TesseraError::InvalidEmissionRate(self.daily_emission_rate));
        }
        if self.randomness_timeout_days == 0 {
            return Err(TesseraError::Other("randomness timeout must be at least one day".into()));
        }
        Ok(())
    }

    /// Day oracle anchored at this configuration's genesis.
    pub fn clock(&self) -> WallClock {
        WallClock::new(self.genesis_timestamp)
    }
}
