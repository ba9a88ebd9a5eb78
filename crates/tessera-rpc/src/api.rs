use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{
    RpcAccount, RpcCommissionRecord, RpcMajority, RpcPoolInfo, RpcProtocolInfo,
    RpcRandomnessRequest, RpcRewardRecord, RpcStakeSnapshot, RpcValidationRecord, RpcValidator,
    RpcWinner,
};

/// Tessera JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "tessera_" via `namespace = "tessera"`.
/// Addresses are base-58, hashes and transaction ids hex, amounts decimal
/// strings of base units.
#[rpc(server, namespace = "tessera")]
pub trait TesseraApi {
    /// Current day index, parameters and administrative addresses.
    #[method(name = "getProtocolInfo")]
    async fn get_protocol_info(&self) -> RpcResult<RpcProtocolInfo>;

    // ── Accounts and stake ───────────────────────────────────────────────────

    #[method(name = "getAccount")]
    async fn get_account(&self, address: String) -> RpcResult<RpcAccount>;

    #[method(name = "getBalance")]
    async fn get_balance(&self, address: String) -> RpcResult<String>;

    /// Stake that may be unlocked today.
    #[method(name = "getUnlockable")]
    async fn get_unlockable(&self, address: String) -> RpcResult<String>;

    /// Locked and delegated stake of `address` as of `day`.
    #[method(name = "getStakeSnapshot")]
    async fn get_stake_snapshot(&self, address: String, day: u64) -> RpcResult<RpcStakeSnapshot>;

    /// Total stake delegated to `validator` as of `day`.
    #[method(name = "getValidatorStake")]
    async fn get_validator_stake(&self, validator: String, day: u64) -> RpcResult<String>;

    #[method(name = "getValidators")]
    async fn get_validators(&self) -> RpcResult<Vec<RpcValidator>>;

    // ── Consensus ────────────────────────────────────────────────────────────

    /// Majority for `index`: frozen once finalized, provisional before.
    #[method(name = "getMajority")]
    async fn get_majority(&self, index: u64) -> RpcResult<RpcMajority>;

    #[method(name = "getWinner")]
    async fn get_winner(&self, index: u64) -> RpcResult<RpcWinner>;

    /// Randomness requests still waiting for delivery.
    #[method(name = "getPendingRandomness")]
    async fn get_pending_randomness(&self) -> RpcResult<Vec<RpcRandomnessRequest>>;

    // ── Rewards ──────────────────────────────────────────────────────────────

    #[method(name = "getPoolInfo")]
    async fn get_pool_info(&self, day: u64) -> RpcResult<RpcPoolInfo>;

    /// Amount already paid to `receiver` through tickets of `kind`
    /// ("staking" or "certified").
    #[method(name = "getTicketHighWater")]
    async fn get_ticket_high_water(&self, kind: String, receiver: String) -> RpcResult<String>;

    /// Up to `count` decided days at or before `day`, newest first.
    #[method(name = "getStakingRewardHistory")]
    async fn get_staking_reward_history(
        &self,
        delegator: String,
        day: u64,
        count: usize,
    ) -> RpcResult<Vec<RpcRewardRecord>>;

    #[method(name = "getCommissionHistory")]
    async fn get_commission_history(
        &self,
        validator: String,
        day: u64,
        count: usize,
    ) -> RpcResult<Vec<RpcCommissionRecord>>;

    #[method(name = "getValidationHistory")]
    async fn get_validation_history(&self, day: u64, count: usize) -> RpcResult<Vec<RpcValidationRecord>>;

    // ── Transactions ─────────────────────────────────────────────────────────

    /// Submit a signed transaction. `tx_hex` is hex-encoded bincode(Transaction).
    /// Returns the TxId hex once queued.
    #[method(name = "sendTransaction")]
    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String>;

    /// An applied transaction as hex-encoded bincode(Transaction), or null.
    #[method(name = "getTransaction")]
    async fn get_transaction(&self, tx_id: String) -> RpcResult<Option<String>>;
}
