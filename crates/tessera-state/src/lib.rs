//! tessera-state
//!
//! The whole protocol state, the signed-transaction engine that mutates it,
//! and the sled store it is persisted in.

pub mod config;
pub mod db;
pub mod engine;
pub mod protocol;
pub mod roles;

pub use config::ProtocolConfig;
pub use db::StateDb;
pub use engine::StateEngine;
pub use protocol::{ApplyOutcome, ProtocolState};
pub use roles::Roles;
