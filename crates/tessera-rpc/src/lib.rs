//! tessera-rpc
//!
//! JSON-RPC 2.0 server for Tessera nodes.
//!
//! Namespace: "tessera"
//! Methods:
//!   tessera_getProtocolInfo          — current day, parameters, owner, ticket signer
//!   tessera_getAccount               — balance, nonce and stake of an address
//!   tessera_getBalance               — free balance in base units
//!   tessera_getUnlockable            — stake past its holding period
//!   tessera_getStakeSnapshot         — locked/delegated stake as of a day
//!   tessera_getValidatorStake        — total delegated to a validator as of a day
//!   tessera_getValidators            — the validator whitelist
//!   tessera_getMajority              — majority hash and submitters for an index
//!   tessera_getWinner                — winner and status for an index
//!   tessera_getPendingRandomness     — open randomness requests
//!   tessera_getPoolInfo              — staking pool balance and daily reward for a day
//!   tessera_getTicketHighWater       — amount already paid through tickets
//!   tessera_getStakingRewardHistory  — per-day delegator rewards
//!   tessera_getCommissionHistory     — per-day validator commission
//!   tessera_getValidationHistory     — decided days with hash and reward
//!   tessera_sendTransaction          — submit a signed transaction (hex-encoded bincode)
//!   tessera_getTransaction           — an applied transaction by TxId hex

pub mod api;
pub mod server;
pub mod types;

pub use server::RpcServer;
pub use server::RpcServerState;
pub use types::{
    RpcAccount, RpcCommissionRecord, RpcMajority, RpcPoolInfo, RpcProtocolInfo,
    RpcRandomnessRequest, RpcRewardRecord, RpcStakeSnapshot, RpcValidationRecord, RpcValidator,
    RpcWinner,
};
