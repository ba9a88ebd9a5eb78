use thiserror::Error;

use crate::types::{Amount, Day, LogIndex};

#[derive(Debug, Error)]
pub enum TesseraError {
    // ── Authorization errors ─────────────────────────────────────────────────
    #[error("caller lacks required role: {0}")]
    MissingRole(&'static str),

    #[error("not a whitelisted validator or submitter: {0}")]
    NotValidator(String),

    #[error("validator is disabled: {0}")]
    ValidatorDisabled(String),

    #[error("caller is not the ticket receiver")]
    NotTicketReceiver,

    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("sender address does not match the signing key")]
    SenderKeyMismatch,

    // ── Temporal errors ──────────────────────────────────────────────────────
    #[error("day {day} is not after the current day {today}")]
    DayNotInFuture { day: Day, today: Day },

    #[error("supply day {day} must be after the latest scheduled day {latest}")]
    SupplyBeforeScheduled { day: Day, latest: Day },

    #[error("delegation already changed on day {day}")]
    SameDayValidatorChange { day: Day },

    #[error("history entry for day {day} precedes the last recorded day {last}")]
    HistoryOutOfOrder { day: Day, last: Day },

    #[error("index {index} is behind the validator's current index {pointer}")]
    IndexInPast { index: LogIndex, pointer: LogIndex },

    #[error("index {index} skips ahead of the validator's current index {pointer}")]
    IndexSkipsAhead { index: LogIndex, pointer: LogIndex },

    #[error("index {index} lies after the current day {today}")]
    IndexNotReached { index: LogIndex, today: Day },

    #[error("index {0} is already finalized")]
    IndexFinalized(LogIndex),

    // ── State errors ─────────────────────────────────────────────────────────
    #[error("index {0} is not decided")]
    NotDecided(LogIndex),

    #[error("day {0} was already recycled")]
    AlreadyRecycled(Day),

    #[error("day {day} is not recyclable (status: {status})")]
    NotRecyclable { day: Day, status: String },

    #[error("unknown validator: {0}")]
    UnknownValidator(String),

    #[error("validator already registered: {0}")]
    ValidatorAlreadyRegistered(String),

    #[error("validator already disabled: {0}")]
    ValidatorAlreadyDisabled(String),

    #[error("validator already enabled: {0}")]
    ValidatorAlreadyEnabled(String),

    #[error("commission rate {0} exceeds 100%")]
    InvalidCommissionRate(u128),

    #[error("emission rate {0} must be within (0, 100%)")]
    InvalidEmissionRate(u128),

    #[error("unknown randomness request: {0}")]
    UnknownRandomnessRequest(u64),

    #[error("randomness for index {index} expired (requested on day {requested_day})")]
    RandomnessExpired { index: LogIndex, requested_day: Day },

    #[error("index {0} has no pending randomness request")]
    RandomnessNotPending(LogIndex),

    #[error("validator has no previous submission to carry forward")]
    NothingToCarryForward,

    #[error("paired tickets name different receivers")]
    ReceiverMismatch,

    #[error("batch too large: max {max}, got {got}")]
    BatchTooLarge { max: usize, got: usize },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("self-transfer not allowed")]
    SelfTransfer,

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    // ── Signature errors ─────────────────────────────────────────────────────
    #[error("invalid head signer: ticket signer not authorized by the standing signer")]
    InvalidHeadSigner,

    #[error("invalid body signer: ticket payload not signed by the declared ticket signer")]
    InvalidBodySigner,

    // ── Insufficiency errors ─────────────────────────────────────────────────
    #[error("insufficient unlockable stake: need {need}, have {have}")]
    InsufficientUnlockable { need: Amount, have: Amount },

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: Amount, have: Amount },

    #[error("pool budget exceeded: need {need}, available {available}")]
    PoolBudgetExceeded { need: Amount, available: Amount },

    #[error("arithmetic overflow")]
    Overflow,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}
