use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tokio::sync::RwLock;
use tracing::{info, warn};

use tessera_core::interfaces::{DayClock, StakeView};
use tessera_core::ticket::TicketKind;
use tessera_core::transaction::Transaction;
use tessera_core::types::{Address, TxId};
use tessera_state::StateEngine;

use crate::api::TesseraApiServer;
use crate::types::{
    optional_address, RpcAccount, RpcCommissionRecord, RpcMajority, RpcPoolInfo, RpcProtocolInfo,
    RpcRandomnessRequest, RpcRewardRecord, RpcStakeSnapshot, RpcValidationRecord, RpcValidator,
    RpcWinner,
};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn parse_address(s: &str) -> Result<Address, ErrorObject<'static>> {
    Address::from_b58(s).map_err(|e| rpc_err(-32602, format!("invalid address: {e}")))
}

fn parse_kind(s: &str) -> Result<TicketKind, ErrorObject<'static>> {
    match s {
        "staking" => Ok(TicketKind::Staking),
        "certified" => Ok(TicketKind::Certified),
        other => Err(rpc_err(-32602, format!("unknown ticket kind: {other}"))),
    }
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    /// The node's engine; queries take the read lock.
    pub engine: Arc<RwLock<StateEngine>>,
    /// Day oracle used as "today" for every query.
    pub clock: Box<dyn DayClock + Send + Sync>,
    /// Optional sender to forward incoming transactions to the node pipeline.
    pub tx_sender: Option<tokio::sync::mpsc::Sender<Transaction>>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let server = Server::builder().build(addr).await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }

    fn today(&self) -> u64 {
        self.state.clock.current_day()
    }
}

#[async_trait]
impl TesseraApiServer for RpcServer {
    async fn get_protocol_info(&self) -> RpcResult<RpcProtocolInfo> {
        let engine = self.state.engine.read().await;
        let st = engine.state();
        Ok(RpcProtocolInfo {
            current_day: self.today(),
            genesis_timestamp: st.config.genesis_timestamp,
            daily_emission_rate: st.config.daily_emission_rate.to_string(),
            unlock_holding_days: st.config.unlock_holding_days,
            randomness_timeout_days: st.config.randomness_timeout_days,
            commission_activation_delay_days: st.config.commission_activation_delay_days,
            owner: st.roles.owner().to_b58(),
            ticket_signer: st.roles.ticket_signer().to_b58(),
            next_unfinalized_index: st.consensus.next_unfinalized(),
            active_validators: st.validators.active_count(),
        })
    }

    async fn get_account(&self, address: String) -> RpcResult<RpcAccount> {
        let addr = parse_address(&address)?;
        let today = self.today();
        let engine = self.state.engine.read().await;
        let st = engine.state();
        Ok(RpcAccount {
            address: addr.to_b58(),
            balance: st.balance_of(&addr).to_string(),
            nonce: st.nonce_of(&addr),
            locked: st.stake.locked_as_of(today, &addr).to_string(),
            unlockable: st.unlockable(&addr, today).to_string(),
            delegated: st.stake.delegated_as_of(today, &addr).to_string(),
            validator: optional_address(st.stake.current_validator(&addr)),
        })
    }

    async fn get_balance(&self, address: String) -> RpcResult<String> {
        let addr = parse_address(&address)?;
        let engine = self.state.engine.read().await;
        Ok(engine.state().balance_of(&addr).to_string())
    }

    async fn get_unlockable(&self, address: String) -> RpcResult<String> {
        let addr = parse_address(&address)?;
        let today = self.today();
        let engine = self.state.engine.read().await;
        Ok(engine.state().unlockable(&addr, today).to_string())
    }

    async fn get_stake_snapshot(&self, address: String, day: u64) -> RpcResult<RpcStakeSnapshot> {
        let addr = parse_address(&address)?;
        let engine = self.state.engine.read().await;
        let stake = &engine.state().stake;
        Ok(RpcStakeSnapshot {
            day,
            locked: stake.locked_as_of(day, &addr).to_string(),
            delegated: stake.delegated_as_of(day, &addr).to_string(),
            validator: optional_address(stake.validator_of(day, &addr)),
        })
    }

    async fn get_validator_stake(&self, validator: String, day: u64) -> RpcResult<String> {
        let addr = parse_address(&validator)?;
        let engine = self.state.engine.read().await;
        Ok(engine.state().stake.delegated_total_as_of(day, &addr).to_string())
    }

    async fn get_validators(&self) -> RpcResult<Vec<RpcValidator>> {
        let today = self.today();
        let engine = self.state.engine.read().await;
        let st = engine.state();
        Ok(st
            .validators
            .iter()
            .map(|v| {
                RpcValidator::new(
                    v,
                    &st.validators,
                    today,
                    st.stake.delegated_total_as_of(today, &v.address),
                    st.consensus.pointer_of(&v.address),
                )
            })
            .collect())
    }

    async fn get_majority(&self, index: u64) -> RpcResult<RpcMajority> {
        let engine = self.state.engine.read().await;
        let st = engine.state();
        let finalized = index < st.consensus.next_unfinalized();
        Ok(RpcMajority::new(index, &st.majority(index), finalized))
    }

    async fn get_winner(&self, index: u64) -> RpcResult<RpcWinner> {
        let today = self.today();
        let engine = self.state.engine.read().await;
        let (winner, status) = engine.state().winner(index, today);
        Ok(RpcWinner {
            index,
            winner: winner.to_b58(),
            status: status.to_string(),
        })
    }

    async fn get_pending_randomness(&self) -> RpcResult<Vec<RpcRandomnessRequest>> {
        let today = self.today();
        let engine = self.state.engine.read().await;
        let st = engine.state();
        let timeout = st.consensus.randomness_timeout();
        Ok(st
            .pending_randomness(today)
            .iter()
            .map(|r| RpcRandomnessRequest::new(r, timeout))
            .collect())
    }

    async fn get_pool_info(&self, day: u64) -> RpcResult<RpcPoolInfo> {
        let engine = self.state.engine.read().await;
        let rewards = &engine.state().rewards;
        Ok(RpcPoolInfo {
            day,
            staking_balance: rewards.staking.balance_at(day).to_string(),
            daily_reward: rewards.staking.daily_reward(day).to_string(),
            last_scheduled_day: rewards.staking.last_scheduled_day(),
            recycled: rewards.staking.is_recycled(day),
            certified_supplied: rewards.certified.total_supplied().to_string(),
            certified_available: rewards.certified.available().to_string(),
        })
    }

    async fn get_ticket_high_water(&self, kind: String, receiver: String) -> RpcResult<String> {
        let kind = parse_kind(&kind)?;
        let addr = parse_address(&receiver)?;
        let engine = self.state.engine.read().await;
        Ok(engine.state().ticket_high_water(kind, &addr).to_string())
    }

    async fn get_staking_reward_history(
        &self,
        delegator: String,
        day: u64,
        count: usize,
    ) -> RpcResult<Vec<RpcRewardRecord>> {
        let addr = parse_address(&delegator)?;
        let today = self.today();
        let engine = self.state.engine.read().await;
        Ok(engine
            .state()
            .staking_reward_history(&addr, day, count, today)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn get_commission_history(
        &self,
        validator: String,
        day: u64,
        count: usize,
    ) -> RpcResult<Vec<RpcCommissionRecord>> {
        let addr = parse_address(&validator)?;
        let today = self.today();
        let engine = self.state.engine.read().await;
        Ok(engine
            .state()
            .commission_history(&addr, day, count, today)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn get_validation_history(&self, day: u64, count: usize) -> RpcResult<Vec<RpcValidationRecord>> {
        let today = self.today();
        let engine = self.state.engine.read().await;
        Ok(engine
            .state()
            .validation_history(day, count, today)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String> {
        let tx_bytes =
            hex::decode(&tx_hex).map_err(|e| rpc_err(-32602, format!("invalid hex: {e}")))?;

        let tx: Transaction = bincode::deserialize(&tx_bytes)
            .map_err(|e| rpc_err(-32602, format!("invalid transaction encoding: {e}")))?;

        let tx_id = tx.tx_id.to_hex();

        if let Some(sender) = &self.state.tx_sender {
            sender
                .send(tx)
                .await
                .map_err(|_| rpc_err(-32603, "transaction queue closed"))?;
        } else {
            warn!("RPC: sendTransaction called but no tx pipeline configured");
            return Err(rpc_err(-32603, "node tx pipeline not connected"));
        }

        Ok(tx_id)
    }

    async fn get_transaction(&self, tx_id: String) -> RpcResult<Option<String>> {
        let id = TxId::from_hex(&tx_id)
            .map_err(|e| rpc_err(-32602, format!("invalid tx id: {e}")))?;

        let engine = self.state.engine.read().await;
        let record = engine
            .db
            .get_transaction(&id)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        match record {
            None => Ok(None),
            Some(r) => {
                let bytes = bincode::serialize(&r.tx)
                    .map_err(|e| rpc_err(-32603, e.to_string()))?;
                Ok(Some(hex::encode(bytes)))
            }
        }
    }
}
