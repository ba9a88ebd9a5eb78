use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use tessera_core::constants::{MAX_CLAIM_BATCH_DAYS, MAX_HISTORY_RECORDS, MAX_TICKET_BATCH};
use tessera_core::error::TesseraError;
use tessera_core::interfaces::TokenLedger;
use tessera_core::outcome::DayOutcome;
use tessera_core::ticket::{TicketClaim, TicketKind};
use tessera_core::types::{Address, Amount, Day, LogHash, Rate};
use tessera_crypto::verify_ticket;

use crate::accrual::{commission_share, delegator_share, walk, AccrualContext, ClaimReceipt};
use crate::history::{CommissionRecord, RewardRecord, ValidationRecord};
use crate::pool::{CertifiedPool, StakingPool};
use crate::tickets::{Redeemer, TicketBook, TicketPayout};

/// Reward pools, claim cursors and ticket high-water marks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardLedger {
    pub staking: StakingPool,
    pub certified: CertifiedPool,
    /// Next unpaid day per delegator.
    delegator_cursors: BTreeMap<Address, Day>,
    /// Next unpaid day per validator.
    commission_cursors: BTreeMap<Address, Day>,
    tickets: TicketBook,
}

impl RewardLedger {
    pub fn new(emission_rate: Rate) -> Result<Self, TesseraError> {
        Ok(Self {
            staking: StakingPool::new(emission_rate)?,
            ..Self::default()
        })
    }

    pub fn delegator_cursor(&self, delegator: &Address) -> Option<Day> {
        self.delegator_cursors.get(delegator).copied()
    }

    pub fn commission_cursor(&self, validator: &Address) -> Option<Day> {
        self.commission_cursors.get(validator).copied()
    }

    pub fn ticket_high_water(&self, kind: TicketKind, receiver: &Address) -> Amount {
        self.tickets.high_water(kind, receiver)
    }

    fn check_batch(batch_days: u64) -> Result<(), TesseraError> {
        if batch_days == 0 || batch_days > MAX_CLAIM_BATCH_DAYS {
            return Err(TesseraError::BatchTooLarge {
                max: MAX_CLAIM_BATCH_DAYS as usize,
                got: batch_days as usize,
            });
        }
        Ok(())
    }

    fn pay_staking(&self, to: &Address, amount: Amount, tokens: &mut dyn TokenLedger) -> Result<(), TesseraError> {
        if amount == 0 {
            return Ok(());
        }
        let escrow = self.staking.escrow();
        let available = tokens.balance_of(&escrow);
        if amount > available {
            return Err(TesseraError::PoolBudgetExceeded { need: amount, available });
        }
        tokens.transfer(&escrow, to, amount)
    }

    /// Pay `delegator` for up to `batch_days` days after its cursor.
    pub fn claim_staking_reward(
        &mut self,
        delegator: &Address,
        batch_days: u64,
        today: Day,
        ctx: &AccrualContext<'_>,
        tokens: &mut dyn TokenLedger,
    ) -> Result<ClaimReceipt, TesseraError> {
        Self::check_batch(batch_days)?;
        let start = match self.delegator_cursors.get(delegator) {
            Some(day) => *day,
            None => match ctx.stake.delegation_start(delegator) {
                Some(day) => day,
                None => today,
            },
        };

        let receipt = walk(&self.staking, ctx.outcomes, *delegator, start, batch_days, today, |day, winner, daily| {
            delegator_share(ctx, day, delegator, winner, daily)
        });
        self.pay_staking(delegator, receipt.amount, tokens)?;
        if receipt.days_walked > 0 {
            self.delegator_cursors.insert(*delegator, receipt.next_day);
        }
        info!(
            delegator = %delegator,
            amount = receipt.amount,
            from = receipt.from_day,
            next = receipt.next_day,
            "staking reward claimed"
        );
        Ok(receipt)
    }

    /// Pay `validator` its commission for up to `batch_days` days.
    pub fn claim_commission(
        &mut self,
        validator: &Address,
        batch_days: u64,
        today: Day,
        ctx: &AccrualContext<'_>,
        tokens: &mut dyn TokenLedger,
    ) -> Result<ClaimReceipt, TesseraError> {
        Self::check_batch(batch_days)?;
        let start = match self.commission_cursors.get(validator) {
            Some(day) => *day,
            None => ctx
                .registry
                .registered_on(validator)
                .ok_or_else(|| TesseraError::UnknownValidator(validator.to_string()))?,
        };

        let receipt = walk(&self.staking, ctx.outcomes, *validator, start, batch_days, today, |day, winner, daily| {
            if winner == validator {
                commission_share(ctx, day, validator, daily)
            } else {
                0
            }
        });
        self.pay_staking(validator, receipt.amount, tokens)?;
        if receipt.days_walked > 0 {
            self.commission_cursors.insert(*validator, receipt.next_day);
        }
        info!(
            validator = %validator,
            amount = receipt.amount,
            from = receipt.from_day,
            next = receipt.next_day,
            "commission claimed"
        );
        Ok(receipt)
    }

    /// Move the emission of a day nobody can claim onto `target_day`.
    pub fn recycle_staking_pool(
        &mut self,
        target_day: Day,
        source_day: Day,
        today: Day,
        ctx: &AccrualContext<'_>,
    ) -> Result<Amount, TesseraError> {
        let outcome = ctx.outcomes.outcome(source_day, today);
        if !outcome.is_recyclable() {
            return Err(TesseraError::NotRecyclable {
                day: source_day,
                status: outcome.status().to_string(),
            });
        }
        self.staking.recycle(target_day, source_day, today)
    }

    /// Redeem delta tickets, paying each receiver what its tickets add above
    /// the amount already paid.
    ///
    /// A ticket at or below the high-water mark succeeds without paying.
    ///
    /// Staking tickets and `claim_staking_reward` both draw on the staking
    /// escrow without seeing each other's payouts; the standing ticket signer
    /// must not issue staking tickets for amounts also claimable on-ledger.
    pub fn redeem_tickets(
        &mut self,
        redeemer: Redeemer,
        claims: &[TicketClaim],
        standing_signer: &Address,
        tokens: &mut dyn TokenLedger,
    ) -> Result<Vec<TicketPayout>, TesseraError> {
        if claims.len() > MAX_TICKET_BATCH {
            return Err(TesseraError::BatchTooLarge {
                max: MAX_TICKET_BATCH,
                got: claims.len(),
            });
        }
        for claim in claims {
            if let TicketClaim::Pair { staking, certified } = claim {
                if staking.receiver != certified.receiver {
                    return Err(TesseraError::ReceiverMismatch);
                }
            }
            if let Redeemer::Direct(caller) = redeemer {
                if claim.tickets().iter().any(|(_, t)| t.receiver != caller) {
                    return Err(TesseraError::NotTicketReceiver);
                }
            }
        }

        let mut payouts = Vec::new();
        for claim in claims {
            for (kind, ticket) in claim.tickets() {
                verify_ticket(kind, ticket, standing_signer)?;
                let delta = self.tickets.advance(kind, &ticket.receiver, ticket.accumulated_amount);
                if delta == 0 {
                    debug!(receiver = %ticket.receiver, ?kind, amount = ticket.accumulated_amount, "ticket at or below high-water mark");
                } else {
                    match kind {
                        TicketKind::Staking => self.pay_staking(&ticket.receiver, delta, tokens)?,
                        TicketKind::Certified => self.certified.pay(&ticket.receiver, delta, tokens)?,
                    }
                    info!(receiver = %ticket.receiver, ?kind, paid = delta, high_water = ticket.accumulated_amount, "ticket redeemed");
                }
                payouts.push(TicketPayout {
                    kind,
                    receiver: ticket.receiver,
                    paid: delta,
                    high_water: self.tickets.high_water(kind, &ticket.receiver),
                });
            }
        }
        Ok(payouts)
    }

    // ── History ──────────────────────────────────────────────────────────────

    /// Most recent `count` decided days on or before `day`, newest first,
    /// with what `delegator` earned on each.
    pub fn staking_reward_history(
        &self,
        delegator: &Address,
        day: Day,
        count: usize,
        today: Day,
        ctx: &AccrualContext<'_>,
    ) -> Vec<RewardRecord> {
        self.decided_days(day, count, today, ctx)
            .into_iter()
            .map(|(d, winner, _)| {
                let daily = self.staking.daily_reward(d);
                RewardRecord {
                    day: d,
                    winner,
                    validator: ctx.stake.validator_of(d, delegator),
                    amount: delegator_share(ctx, d, delegator, &winner, daily),
                }
            })
            .collect()
    }

    pub fn commission_history(
        &self,
        validator: &Address,
        day: Day,
        count: usize,
        today: Day,
        ctx: &AccrualContext<'_>,
    ) -> Vec<CommissionRecord> {
        self.decided_days(day, count, today, ctx)
            .into_iter()
            .map(|(d, winner, _)| CommissionRecord {
                day: d,
                winner,
                amount: if winner == *validator {
                    commission_share(ctx, d, validator, self.staking.daily_reward(d))
                } else {
                    0
                },
            })
            .collect()
    }

    pub fn validation_history(
        &self,
        day: Day,
        count: usize,
        today: Day,
        ctx: &AccrualContext<'_>,
    ) -> Vec<ValidationRecord> {
        self.decided_days(day, count, today, ctx)
            .into_iter()
            .map(|(d, winner, hash)| ValidationRecord {
                day: d,
                winner,
                hash,
                daily_reward: self.staking.daily_reward(d),
            })
            .collect()
    }

    fn decided_days(
        &self,
        day: Day,
        count: usize,
        today: Day,
        ctx: &AccrualContext<'_>,
    ) -> Vec<(Day, Address, LogHash)> {
        ctx.outcomes
            .decided_at_or_before(day, count.min(MAX_HISTORY_RECORDS))
            .into_iter()
            .filter_map(|d| match ctx.outcomes.outcome(d, today) {
                DayOutcome::Decided { winner, hash } => Some((d, winner, hash)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tessera_consensus::ValidatorSet;
    use tessera_core::account::TokenBalances;
    use tessera_core::constants::{ONE_TOKEN, RATE_PRECISION};
    use tessera_core::interfaces::{OutcomeView, ValidatorRegistry};
    use tessera_core::types::LogIndex;
    use tessera_crypto::{KeyPair, TicketIssuer};
    use tessera_stake::StakeLedger;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    #[derive(Default)]
    struct Outcomes(BTreeMap<LogIndex, DayOutcome>);

    impl OutcomeView for Outcomes {
        fn outcome(&self, index: LogIndex, _today: Day) -> DayOutcome {
            self.0
                .get(&index)
                .copied()
                .unwrap_or(DayOutcome::NoWinnerForFutureDate)
        }

        fn decided_at_or_before(&self, index: LogIndex, limit: usize) -> Vec<LogIndex> {
            self.0
                .range(..=index)
                .rev()
                .filter(|(_, o)| matches!(o, DayOutcome::Decided { .. }))
                .map(|(d, _)| *d)
                .take(limit)
                .collect()
        }
    }

    fn won_by(v: Address) -> DayOutcome {
        DayOutcome::Decided {
            winner: v,
            hash: LogHash([1; 32]),
        }
    }

    const V1: u8 = 0xA1;
    const V2: u8 = 0xA2;
    const MAINTAINER: u8 = 0xEE;

    /// Two validators; V1 charges 10% commission. Delegators 1 and 2 back V1
    /// with 100 and 300 from day 0, delegator 3 backs V2. The pool starts on
    /// day 1 with 10% daily emission.
    struct World {
        tokens: TokenBalances,
        validators: ValidatorSet,
        stake: StakeLedger,
        outcomes: Outcomes,
        rewards: RewardLedger,
    }

    impl World {
        fn new() -> Self {
            let mut tokens = TokenBalances::new();
            let mut validators = ValidatorSet::default();
            let mut stake = StakeLedger::default();
            validators.add(addr(V1), addr(V1), RATE_PRECISION / 10, 0).unwrap();
            validators.add(addr(V2), addr(V2), 0, 0).unwrap();
            for (d, amount, v) in [(1u8, 100, V1), (2, 300, V1), (3, 50, V2)] {
                tokens.mint(&addr(d), amount).unwrap();
                stake
                    .lock_and_delegate(&addr(d), amount, &addr(v), 0, &validators, &mut tokens)
                    .unwrap();
            }
            tokens.mint(&addr(MAINTAINER), 1_000_000 * ONE_TOKEN).unwrap();
            let mut rewards = RewardLedger::new(RATE_PRECISION / 10).unwrap();
            rewards
                .staking
                .supply(&addr(MAINTAINER), 1, 10_000 * ONE_TOKEN, 0, &mut tokens)
                .unwrap();
            Self {
                tokens,
                validators,
                stake,
                outcomes: Outcomes::default(),
                rewards,
            }
        }

        fn ctx(&self) -> AccrualContext<'_> {
            AccrualContext {
                outcomes: &self.outcomes,
                stake: &self.stake,
                registry: &self.validators,
            }
        }

        fn claim(&mut self, d: u8, batch: u64, today: Day) -> ClaimReceipt {
            let ctx = AccrualContext {
                outcomes: &self.outcomes,
                stake: &self.stake,
                registry: &self.validators,
            };
            self.rewards
                .claim_staking_reward(&addr(d), batch, today, &ctx, &mut self.tokens)
                .unwrap()
        }
    }

    #[test]
    fn delegators_share_net_of_commission() {
        let mut w = World::new();
        w.outcomes.0.insert(0, DayOutcome::NoSubmissionToday);
        w.outcomes.0.insert(1, won_by(addr(V1)));
        w.outcomes.0.insert(2, won_by(addr(V2)));

        let daily1 = w.rewards.staking.daily_reward(1);
        let r = w.claim(2, 10, 3);
        // 300 of 400 on day 1, minus 10% commission; nothing on day 2.
        assert_eq!(r.amount, daily1 * 3 / 4 * 9 / 10);
        assert_eq!(r.next_day, 3);
        assert!(r.caught_up);
        assert_eq!(w.tokens.balance_of(&addr(2)), r.amount);

        let again = w.claim(2, 10, 3);
        assert_eq!(again.amount, 0);
    }

    #[test]
    fn commission_is_daily_times_rate() {
        let mut w = World::new();
        w.outcomes.0.insert(0, DayOutcome::NoMajority);
        w.outcomes.0.insert(1, won_by(addr(V1)));
        w.outcomes.0.insert(2, won_by(addr(V1)));
        let expected = (w.rewards.staking.daily_reward(1) + w.rewards.staking.daily_reward(2)) / 10;

        let ctx = AccrualContext {
            outcomes: &w.outcomes,
            stake: &w.stake,
            registry: &w.validators,
        };
        let r = w
            .rewards
            .claim_commission(&addr(V1), 100, 3, &ctx, &mut w.tokens)
            .unwrap();
        assert_eq!(r.amount, expected);
        assert_eq!(w.rewards.commission_cursor(&addr(V1)), Some(3));
    }

    #[test]
    fn claim_stops_at_pending_day() {
        let mut w = World::new();
        w.outcomes.0.insert(0, won_by(addr(V1)));
        w.outcomes.0.insert(1, won_by(addr(V1)));
        w.outcomes.0.insert(2, DayOutcome::Pending);
        w.outcomes.0.insert(3, won_by(addr(V1)));

        let r = w.claim(1, 10, 5);
        assert_eq!(r.next_day, 2);
        assert!(!r.caught_up);

        w.outcomes.0.insert(2, DayOutcome::Abandoned);
        let r = w.claim(1, 10, 5);
        assert_eq!(r.from_day, 2);
        assert_eq!(r.amount, w.rewards.staking.daily_reward(3) / 4 * 9 / 10);
    }

    #[test]
    fn batches_resume_where_they_left_off() {
        let mut w = World::new();
        for d in 0..8 {
            w.outcomes.0.insert(d, won_by(addr(V2)));
        }
        let full: Amount = (0..8).map(|d| w.rewards.staking.daily_reward(d)).sum();

        let a = w.claim(3, 3, 8);
        assert_eq!((a.from_day, a.next_day, a.caught_up), (0, 3, false));
        let b = w.claim(3, 3, 8);
        let c = w.claim(3, 3, 8);
        assert_eq!(c.next_day, 8);
        assert!(c.caught_up);
        // V2 charges nothing and delegator 3 is its only backer.
        assert_eq!(a.amount + b.amount + c.amount, full);
    }

    #[test]
    fn oversized_batch_rejected() {
        let mut w = World::new();
        let ctx = AccrualContext {
            outcomes: &w.outcomes,
            stake: &w.stake,
            registry: &w.validators,
        };
        assert!(matches!(
            w.rewards
                .claim_staking_reward(&addr(1), MAX_CLAIM_BATCH_DAYS + 1, 3, &ctx, &mut w.tokens),
            Err(TesseraError::BatchTooLarge { .. })
        ));
    }

    #[test]
    fn recycle_only_undecided_days() {
        let mut w = World::new();
        w.outcomes.0.insert(1, won_by(addr(V1)));
        w.outcomes.0.insert(2, DayOutcome::NoMajority);
        w.outcomes.0.insert(3, DayOutcome::Pending);
        let ctx = AccrualContext {
            outcomes: &w.outcomes,
            stake: &w.stake,
            registry: &w.validators,
        };
        assert!(matches!(
            w.rewards.recycle_staking_pool(10, 1, 4, &ctx),
            Err(TesseraError::NotRecyclable { day: 1, .. })
        ));
        assert!(matches!(
            w.rewards.recycle_staking_pool(10, 3, 4, &ctx),
            Err(TesseraError::NotRecyclable { day: 3, .. })
        ));
        let emitted = w.rewards.staking.daily_reward(2);
        assert_eq!(w.rewards.recycle_staking_pool(10, 2, 4, &ctx).unwrap(), emitted);
        assert!(matches!(
            w.rewards.recycle_staking_pool(11, 2, 4, &ctx),
            Err(TesseraError::AlreadyRecycled(2))
        ));
    }

    #[test]
    fn histories_skip_undecided_days() {
        let mut w = World::new();
        w.outcomes.0.insert(1, won_by(addr(V1)));
        w.outcomes.0.insert(2, DayOutcome::NoMajority);
        w.outcomes.0.insert(3, won_by(addr(V2)));
        w.outcomes.0.insert(4, DayOutcome::Abandoned);
        w.outcomes.0.insert(5, won_by(addr(V1)));
        let ctx = w.ctx();

        let h = w.rewards.staking_reward_history(&addr(1), 4, 5, 10, &ctx);
        assert_eq!(h.iter().map(|r| r.day).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(h[0].amount, 0);
        assert_eq!(h[1].validator, addr(V1));
        assert!(h[1].amount > 0);

        let c = w.rewards.commission_history(&addr(V1), 10, 2, 10, &ctx);
        assert_eq!(c.iter().map(|r| r.day).collect::<Vec<_>>(), vec![5, 3]);
        assert_eq!(c[1].amount, 0);

        let v = w.rewards.validation_history(10, 10, 10, &ctx);
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].winner, addr(V1));
        assert!(w.validators.is_active(&addr(V1)));
    }

    fn ticket_world() -> (World, KeyPair, TicketIssuer) {
        let mut w = World::new();
        w.rewards
            .certified
            .supply(&addr(MAINTAINER), 1_000, &mut w.tokens)
            .unwrap();
        let standing = KeyPair::generate();
        let issuer = TicketIssuer::authorize(&standing, KeyPair::generate()).unwrap();
        (w, standing, issuer)
    }

    #[test]
    fn ticket_replay_pays_once() {
        let (mut w, standing, issuer) = ticket_world();
        let r = addr(0x51);
        let t = issuer.issue(TicketKind::Staking, r, 700).unwrap();
        let claims = vec![TicketClaim::Staking(t)];

        let first = w
            .rewards
            .redeem_tickets(Redeemer::Direct(r), &claims, &standing.address, &mut w.tokens)
            .unwrap();
        assert_eq!(first[0].paid, 700);
        let second = w
            .rewards
            .redeem_tickets(Redeemer::Relayed, &claims, &standing.address, &mut w.tokens)
            .unwrap();
        assert_eq!(second[0].paid, 0);
        assert_eq!(w.tokens.balance_of(&r), 700);

        let lower = issuer.issue(TicketKind::Staking, r, 500).unwrap();
        let stale = w
            .rewards
            .redeem_tickets(Redeemer::Relayed, &[TicketClaim::Staking(lower)], &standing.address, &mut w.tokens)
            .unwrap();
        assert_eq!(stale[0].paid, 0);
        assert_eq!(w.rewards.ticket_high_water(TicketKind::Staking, &r), 700);
    }

    #[test]
    fn paired_tickets_pay_both_pools() {
        let (mut w, standing, issuer) = ticket_world();
        let r = addr(0x52);
        let claim = TicketClaim::Pair {
            staking: issuer.issue(TicketKind::Staking, r, 10).unwrap(),
            certified: issuer.issue(TicketKind::Certified, r, 20).unwrap(),
        };
        let out = w
            .rewards
            .redeem_tickets(Redeemer::Relayed, &[claim], &standing.address, &mut w.tokens)
            .unwrap();
        assert_eq!(out.iter().map(|p| p.paid).sum::<Amount>(), 30);
        assert_eq!(w.rewards.certified.total_paid(), 20);

        let mismatched = TicketClaim::Pair {
            staking: issuer.issue(TicketKind::Staking, r, 11).unwrap(),
            certified: issuer.issue(TicketKind::Certified, addr(0x53), 21).unwrap(),
        };
        assert!(matches!(
            w.rewards
                .redeem_tickets(Redeemer::Relayed, &[mismatched], &standing.address, &mut w.tokens),
            Err(TesseraError::ReceiverMismatch)
        ));
    }

    #[test]
    fn direct_redemption_requires_receiver() {
        let (mut w, standing, issuer) = ticket_world();
        let t = issuer.issue(TicketKind::Certified, addr(0x54), 5).unwrap();
        assert!(matches!(
            w.rewards.redeem_tickets(
                Redeemer::Direct(addr(0x55)),
                &[TicketClaim::Certified(t)],
                &standing.address,
                &mut w.tokens
            ),
            Err(TesseraError::NotTicketReceiver)
        ));
    }

    #[test]
    fn wrong_standing_signer_is_a_head_error() {
        let (mut w, _standing, issuer) = ticket_world();
        let other = KeyPair::generate();
        let t = issuer.issue(TicketKind::Staking, addr(0x56), 5).unwrap();
        assert!(matches!(
            w.rewards
                .redeem_tickets(Redeemer::Relayed, &[TicketClaim::Staking(t)], &other.address, &mut w.tokens),
            Err(TesseraError::InvalidHeadSigner)
        ));
    }

    #[test]
    fn certified_tickets_capped_by_supply() {
        let (mut w, standing, issuer) = ticket_world();
        let t = issuer.issue(TicketKind::Certified, addr(0x57), 1_001).unwrap();
        assert!(matches!(
            w.rewards
                .redeem_tickets(Redeemer::Relayed, &[TicketClaim::Certified(t)], &standing.address, &mut w.tokens),
            Err(TesseraError::PoolBudgetExceeded { need: 1_001, available: 1_000 })
        ));
    }
}
