use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tessera_consensus::{ConsensusEngine, ConsensusEvent, MajorityRecord, RandomnessRequest, ValidatorSet};
use tessera_core::account::TokenBalances;
use tessera_core::error::TesseraError;
use tessera_core::interfaces::{TokenLedger, ValidatorRegistry};
use tessera_core::outcome::WinnerStatus;
use tessera_core::ticket::TicketKind;
use tessera_core::transaction::{Action, Role};
use tessera_core::types::{Address, Amount, Day, LogIndex, Nonce};
use tessera_rewards::{
    AccrualContext, ClaimReceipt, CommissionRecord, Redeemer, RewardLedger, RewardRecord,
    TicketPayout, ValidationRecord,
};
use tessera_stake::StakeLedger;

use crate::config::ProtocolConfig;
use crate::roles::Roles;

/// What a successfully applied action produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    Done,
    Delegated {
        previous_validator: Address,
        validator: Address,
        delegated: Amount,
    },
    Consensus(Vec<ConsensusEvent>),
    RandomnessRetried { index: LogIndex, request_id: u64 },
    WinnerSelected { winner: Address },
    /// Pool balance after a supply.
    PoolSupplied { balance: Amount },
    Recycled { amount: Amount },
    Claimed(ClaimReceipt),
    Redeemed(Vec<TicketPayout>),
    CommissionScheduled { effective_day: Day },
}

/// Every subsystem of the protocol plus the token ledger and roles.
///
/// `apply_action` mutates in place and may leave the value half-updated when
/// it fails; callers that need atomicity apply to a clone (see
/// `StateEngine::apply`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolState {
    pub config: ProtocolConfig,
    pub tokens: TokenBalances,
    pub roles: Roles,
    pub validators: ValidatorSet,
    pub stake: StakeLedger,
    pub consensus: ConsensusEngine,
    pub rewards: RewardLedger,
}

fn accrual<'a>(
    consensus: &'a ConsensusEngine,
    stake: &'a StakeLedger,
    validators: &'a ValidatorSet,
) -> AccrualContext<'a> {
    AccrualContext {
        outcomes: consensus,
        stake,
        registry: validators,
    }
}

impl ProtocolState {
    pub fn new(config: ProtocolConfig, owner: Address, ticket_signer: Address) -> Result<Self, TesseraError> {
        config.validate()?;
        Ok(Self {
            tokens: TokenBalances::new(),
            roles: Roles::new(owner, ticket_signer),
            validators: ValidatorSet::new(config.commission_activation_delay_days),
            stake: StakeLedger::new(config.unlock_holding_days),
            consensus: ConsensusEngine::new(config.randomness_timeout_days),
            rewards: RewardLedger::new(config.daily_emission_rate)?,
            config,
        })
    }

    fn context(&self) -> AccrualContext<'_> {
        accrual(&self.consensus, &self.stake, &self.validators)
    }

    /// Apply `action` on behalf of the already-authenticated `from`.
    pub fn apply_action(
        &mut self,
        from: &Address,
        action: &Action,
        today: Day,
    ) -> Result<ApplyOutcome, TesseraError> {
        debug!(from = %from, day = today, ?action, "applying action");
        match action {
            // ── Tokens ───────────────────────────────────────────────────────
            Action::Transfer { to, amount } => {
                if *amount == 0 {
                    return Err(TesseraError::ZeroAmount);
                }
                if to == from {
                    return Err(TesseraError::SelfTransfer);
                }
                self.tokens.transfer(from, to, *amount)?;
                info!(from = %from, to = %to, amount, "transfer");
                Ok(ApplyOutcome::Done)
            }

            // ── Stake ledger ─────────────────────────────────────────────────
            Action::LockAndDelegate { amount, validator } => {
                let change = self.stake.lock_and_delegate(
                    from,
                    *amount,
                    validator,
                    today,
                    &self.validators,
                    &mut self.tokens,
                )?;
                Ok(ApplyOutcome::Delegated {
                    previous_validator: change.previous_validator,
                    validator: change.validator,
                    delegated: change.delegated,
                })
            }

            Action::Unlock { amount } => {
                self.stake.unlock(from, *amount, today, &mut self.tokens)?;
                Ok(ApplyOutcome::Done)
            }

            // ── Consensus ────────────────────────────────────────────────────
            Action::SubmitHash { index, hash } => {
                let events =
                    self.consensus
                        .submit(from, *index, *hash, today, &self.validators, &self.stake)?;
                Ok(ApplyOutcome::Consensus(events))
            }

            Action::CarryForward => {
                let events = self
                    .consensus
                    .carry_forward(from, today, &self.validators, &self.stake)?;
                Ok(ApplyOutcome::Consensus(events))
            }

            Action::FulfillRandomness { request_id, value } => {
                self.roles.require(Role::RandomnessOracle, from)?;
                let winner = self.consensus.fulfill_randomness(*request_id, *value, today)?;
                Ok(ApplyOutcome::WinnerSelected { winner })
            }

            Action::RetryRandomness { index } => {
                self.roles.require_owner(from)?;
                let request_id = self.consensus.retry_randomness(*index, today)?;
                Ok(ApplyOutcome::RandomnessRetried {
                    index: *index,
                    request_id,
                })
            }

            // ── Reward pools ─────────────────────────────────────────────────
            Action::SupplyStakingPool { day, amount } => {
                self.roles.require(Role::PoolMaintainer, from)?;
                let balance = self
                    .rewards
                    .staking
                    .supply(from, *day, *amount, today, &mut self.tokens)?;
                Ok(ApplyOutcome::PoolSupplied { balance })
            }

            Action::SupplyCertifiedPool { amount } => {
                self.roles.require(Role::PoolMaintainer, from)?;
                let balance = self.rewards.certified.supply(from, *amount, &mut self.tokens)?;
                Ok(ApplyOutcome::PoolSupplied { balance })
            }

            Action::RecycleStakingPool {
                target_day,
                source_day,
            } => {
                self.roles.require(Role::PoolMaintainer, from)?;
                let ctx = accrual(&self.consensus, &self.stake, &self.validators);
                let amount = self
                    .rewards
                    .recycle_staking_pool(*target_day, *source_day, today, &ctx)?;
                Ok(ApplyOutcome::Recycled { amount })
            }

            // ── Claims ───────────────────────────────────────────────────────
            Action::ClaimStakingReward { batch_days } => {
                let ctx = accrual(&self.consensus, &self.stake, &self.validators);
                let receipt = self.rewards.claim_staking_reward(
                    from,
                    *batch_days,
                    today,
                    &ctx,
                    &mut self.tokens,
                )?;
                Ok(ApplyOutcome::Claimed(receipt))
            }

            Action::ClaimCommission { batch_days } => {
                let validator = self
                    .validators
                    .validator_for_caller(from)
                    .ok_or_else(|| TesseraError::NotValidator(from.to_string()))?;
                let ctx = accrual(&self.consensus, &self.stake, &self.validators);
                let receipt = self.rewards.claim_commission(
                    &validator,
                    *batch_days,
                    today,
                    &ctx,
                    &mut self.tokens,
                )?;
                Ok(ApplyOutcome::Claimed(receipt))
            }

            Action::RedeemTickets { claims, relayed } => {
                let redeemer = if *relayed {
                    self.roles.require(Role::MetaTxWorker, from)?;
                    Redeemer::Relayed
                } else {
                    Redeemer::Direct(*from)
                };
                let standing = self.roles.ticket_signer();
                let payouts = self
                    .rewards
                    .redeem_tickets(redeemer, claims, &standing, &mut self.tokens)?;
                Ok(ApplyOutcome::Redeemed(payouts))
            }

            // ── Administration ───────────────────────────────────────────────
            Action::AddValidator {
                validator,
                submitter,
                commission_rate,
            } => {
                self.roles.require_owner(from)?;
                self.validators.add(*validator, *submitter, *commission_rate, today)?;
                Ok(ApplyOutcome::Done)
            }

            Action::SetValidatorEnabled { validator, enabled } => {
                self.roles.require_owner(from)?;
                self.validators.set_enabled(validator, *enabled)?;
                // A disabled validator no longer holds back finalization.
                let events = self.consensus.advance(today, &self.validators, &self.stake)?;
                Ok(ApplyOutcome::Consensus(events))
            }

            Action::ScheduleCommission { rate } => {
                if !self.validators.is_registered(from) {
                    return Err(TesseraError::NotValidator(from.to_string()));
                }
                let effective_day = self.validators.schedule_commission(from, *rate, today)?;
                Ok(ApplyOutcome::CommissionScheduled { effective_day })
            }

            Action::GrantRole { role, account } => {
                self.roles.require_owner(from)?;
                self.roles.grant(*role, *account);
                Ok(ApplyOutcome::Done)
            }

            Action::RevokeRole { role, account } => {
                self.roles.require_owner(from)?;
                self.roles.revoke(*role, account);
                Ok(ApplyOutcome::Done)
            }

            Action::SetTicketSigner { signer } => {
                self.roles.require_owner(from)?;
                self.roles.set_ticket_signer(*signer);
                Ok(ApplyOutcome::Done)
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.tokens.balance_of(account)
    }

    pub fn nonce_of(&self, account: &Address) -> Nonce {
        self.tokens.nonce_of(account)
    }

    pub fn unlockable(&self, account: &Address, today: Day) -> Amount {
        self.stake.calc_unlockable(account, today)
    }

    pub fn majority(&self, index: LogIndex) -> MajorityRecord {
        self.consensus.get_majority(index, &self.stake)
    }

    pub fn winner(&self, index: LogIndex, today: Day) -> (Address, WinnerStatus) {
        self.consensus.get_winner(index, today)
    }

    pub fn pending_randomness(&self, today: Day) -> Vec<RandomnessRequest> {
        self.consensus.pending_requests(today)
    }

    pub fn ticket_high_water(&self, kind: TicketKind, receiver: &Address) -> Amount {
        self.rewards.ticket_high_water(kind, receiver)
    }

    pub fn staking_reward_history(
        &self,
        delegator: &Address,
        day: Day,
        count: usize,
        today: Day,
    ) -> Vec<RewardRecord> {
        self.rewards
            .staking_reward_history(delegator, day, count, today, &self.context())
    }

    pub fn commission_history(
        &self,
        validator: &Address,
        day: Day,
        count: usize,
        today: Day,
    ) -> Vec<CommissionRecord> {
        self.rewards
            .commission_history(validator, day, count, today, &self.context())
    }

    pub fn validation_history(&self, day: Day, count: usize, today: Day) -> Vec<ValidationRecord> {
        self.rewards.validation_history(day, count, today, &self.context())
    }
}
