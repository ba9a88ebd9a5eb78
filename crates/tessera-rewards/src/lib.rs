//! tessera-rewards
//!
//! Decaying staking pool, certified pool, daily accrual and claims, pool
//! recycling, history queries and delta-ticket redemption.

pub mod accrual;
pub mod history;
pub mod ledger;
pub mod pool;
pub mod tickets;

pub use accrual::{commission_share, delegator_share, AccrualContext, ClaimReceipt};
pub use history::{CommissionRecord, RewardRecord, ValidationRecord};
pub use ledger::RewardLedger;
pub use pool::{CertifiedPool, Emissions, StakingPool};
pub use tickets::{Redeemer, TicketBook, TicketPayout};
