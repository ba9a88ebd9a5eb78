/// ─── Tessera Protocol Constants ─────────────────────────────────────────────
///
/// Amounts are fixed-point integers with 18 decimal places.
/// Rates are fixed-point integers scaled by `RATE_PRECISION`.

// ── Units ────────────────────────────────────────────────────────────────────

/// Decimal places of the staking token.
pub const DECIMALS: u32 = 18;

/// One whole token in base units.
pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Scale of every `Rate` value: `RATE_PRECISION` == 100%.
pub const RATE_PRECISION: u128 = 1_000_000_000_000_000_000;

// ── Time ─────────────────────────────────────────────────────────────────────

/// Length of one protocol day in seconds.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Reference point for the wall-clock day oracle: 2026-01-01 00:00:00 UTC.
pub const GENESIS_TIMESTAMP: i64 = 1_767_225_600;

// ── Stake ledger ─────────────────────────────────────────────────────────────

/// Minimum holding period: an unlock on day D may only release stake that was
/// already locked on day D - UNLOCK_HOLDING_DAYS.
pub const UNLOCK_HOLDING_DAYS: u64 = 180;

// ── Consensus ────────────────────────────────────────────────────────────────

/// Days after a randomness request without fulfilment before the index is
/// abandoned.
pub const RANDOMNESS_TIMEOUT_DAYS: u64 = 30;

// ── Validator registry ───────────────────────────────────────────────────────

/// Delay before a scheduled commission change takes effect.
pub const COMMISSION_ACTIVATION_DELAY_DAYS: u64 = 7;

/// Highest commission rate a validator may charge (100%).
pub const MAX_COMMISSION_RATE: u128 = RATE_PRECISION;

// ── Reward pools ─────────────────────────────────────────────────────────────

/// Default fraction of the staking pool balance emitted each day: 0.5%.
pub const DEFAULT_DAILY_EMISSION_RATE: u128 = RATE_PRECISION / 200;

/// Upper bound on the number of days a single claim call may walk.
pub const MAX_CLAIM_BATCH_DAYS: u64 = 3_650;

/// Upper bound on tickets redeemed in one batched call.
pub const MAX_TICKET_BATCH: usize = 256;

/// Upper bound on records returned by one history query.
pub const MAX_HISTORY_RECORDS: usize = 1_000;

// ── System accounts ──────────────────────────────────────────────────────────

/// Tag of the escrow account holding locked stake.
pub const STAKE_ESCROW_TAG: &str = "stake-escrow";

/// Tag of the escrow account funding the staking reward pool.
pub const STAKING_POOL_TAG: &str = "staking-pool";

/// Tag of the escrow account funding the externally-certified pool.
pub const CERTIFIED_POOL_TAG: &str = "certified-pool";
