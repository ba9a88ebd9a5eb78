use serde::{Deserialize, Serialize};

use tessera_core::interfaces::{OutcomeView, StakeView, ValidatorRegistry};
use tessera_core::math::{apply_complement, apply_rate, mul_div};
use tessera_core::outcome::DayOutcome;
use tessera_core::types::{Address, Amount, Day};

use crate::pool::StakingPool;

/// Read-only collaborators every accrual computation needs.
#[derive(Clone, Copy)]
pub struct AccrualContext<'a> {
    pub outcomes: &'a dyn OutcomeView,
    pub stake: &'a dyn StakeView,
    pub registry: &'a dyn ValidatorRegistry,
}

/// What one claim call paid and how far it walked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub account: Address,
    pub amount: Amount,
    pub from_day: Day,
    /// First day the next claim will look at.
    pub next_day: Day,
    pub days_walked: u64,
    /// The walk stopped at the current day rather than at the batch limit or
    /// at an undecided day.
    pub caught_up: bool,
}

/// Delegator's share of `daily` on a day `winner` won.
pub fn delegator_share(
    ctx: &AccrualContext<'_>,
    day: Day,
    delegator: &Address,
    winner: &Address,
    daily: Amount,
) -> Amount {
    if ctx.stake.validator_of(day, delegator) != *winner {
        return 0;
    }
    let own = ctx.stake.delegated_as_of(day, delegator);
    let total = ctx.stake.delegated_total_as_of(day, winner);
    let gross = mul_div(daily, own, total);
    apply_complement(gross, ctx.registry.commission_rate(winner, day))
}

/// Validator's commission on `daily` for a day it won.
pub fn commission_share(ctx: &AccrualContext<'_>, day: Day, validator: &Address, daily: Amount) -> Amount {
    apply_rate(daily, ctx.registry.commission_rate(validator, day))
}

/// Walk decided days from `start`, summing `per_day` over each.
///
/// Stops at the current day, at the first day whose outcome can still change,
/// or after `batch` days. Days with a terminal non-decided outcome pay
/// nothing but are walked past.
pub(crate) fn walk<F>(
    pool: &StakingPool,
    outcomes: &dyn OutcomeView,
    account: Address,
    start: Day,
    batch: u64,
    today: Day,
    mut per_day: F,
) -> ClaimReceipt
where
    F: FnMut(Day, &Address, Amount) -> Amount,
{
    let mut receipt = ClaimReceipt {
        account,
        amount: 0,
        from_day: start,
        next_day: start,
        days_walked: 0,
        caught_up: start >= today,
    };
    for (day, daily) in pool.emissions(start).take(batch as usize) {
        if day >= today {
            receipt.caught_up = true;
            break;
        }
        let outcome = outcomes.outcome(day, today);
        if !outcome.is_terminal() {
            break;
        }
        if let DayOutcome::Decided { winner, .. } = outcome {
            receipt.amount = receipt.amount.saturating_add(per_day(day, &winner, daily));
        }
        receipt.next_day = day + 1;
        receipt.days_walked += 1;
    }
    if receipt.next_day >= today {
        receipt.caught_up = true;
    }
    receipt
}
