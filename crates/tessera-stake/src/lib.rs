//! tessera-stake
//!
//! Stake ledger: lock, unlock and delegate with point-in-time snapshots per
//! account and per validator.

pub mod ledger;
pub mod record;

pub use ledger::{DelegationChange, StakeLedger};
pub use record::{DelegationRecord, LockRecord};
