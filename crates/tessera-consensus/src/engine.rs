use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use tessera_core::constants::RANDOMNESS_TIMEOUT_DAYS;
use tessera_core::error::TesseraError;
use tessera_core::interfaces::{OutcomeView, StakeView, ValidatorRegistry};
use tessera_core::outcome::{DayOutcome, WinnerStatus};
use tessera_core::types::{Address, Day, LogHash, LogIndex};

use crate::lottery::pick_winner;
use crate::majority::{compute_majority, MajorityRecord};

/// A validator's latest vote for one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub hash: LogHash,
    pub submitted_on: Day,
}

/// Outstanding randomness request for a finalized index with a majority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub index: LogIndex,
    /// Day of the first request; the abandonment deadline counts from here.
    pub requested_day: Day,
    /// Most recent request id issued for the index.
    pub latest_request_id: u64,
}

/// Frozen state of a finalized index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub majority: MajorityRecord,
    pub finalized_on: Day,
    pub winner: Option<Address>,
    pub random_value: Option<u128>,
}

/// Something the engine did that the host should know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusEvent {
    Finalized { index: LogIndex, has_majority: bool },
    RandomnessRequested { request_id: u64, index: LogIndex },
}

/// Daily hash submissions, majority and winner selection.
///
/// Each validator holds a pointer to the index it is currently voting on and
/// may only revote on it or move one step ahead. The lowest unfinalized index
/// freezes once every required validator has moved past it; its majority is
/// then computed against stake snapshots of that day and, when there is one,
/// a randomness request is opened. The winner is drawn when the randomness
/// arrives, unless the request has gone unanswered for the timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusEngine {
    randomness_timeout: u64,
    pointers: BTreeMap<Address, LogIndex>,
    last_hash: BTreeMap<Address, LogHash>,
    votes: BTreeMap<LogIndex, BTreeMap<Address, Submission>>,
    records: BTreeMap<LogIndex, IndexRecord>,
    /// Every index below this one is finalized.
    next_unfinalized: LogIndex,
    /// Highest index any validator has begun.
    frontier: Option<LogIndex>,
    decided: BTreeSet<LogIndex>,
    requests: BTreeMap<u64, LogIndex>,
    pending: BTreeMap<LogIndex, RandomnessRequest>,
    next_request_id: u64,
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(RANDOMNESS_TIMEOUT_DAYS)
    }
}

impl ConsensusEngine {
    pub fn new(randomness_timeout: u64) -> Self {
        Self {
            randomness_timeout,
            pointers: BTreeMap::new(),
            last_hash: BTreeMap::new(),
            votes: BTreeMap::new(),
            records: BTreeMap::new(),
            next_unfinalized: 0,
            frontier: None,
            decided: BTreeSet::new(),
            requests: BTreeMap::new(),
            pending: BTreeMap::new(),
            next_request_id: 0,
        }
    }

    fn resolve_validator(
        caller: &Address,
        registry: &dyn ValidatorRegistry,
    ) -> Result<Address, TesseraError> {
        let validator = registry
            .validator_for_caller(caller)
            .ok_or_else(|| TesseraError::NotValidator(caller.to_string()))?;
        if !registry.is_active(&validator) {
            return Err(TesseraError::ValidatorDisabled(validator.to_string()));
        }
        Ok(validator)
    }

    /// Record `hash` as the caller's vote for `index`.
    ///
    /// The caller may be the validator or its submitter proxy.
    pub fn submit(
        &mut self,
        caller: &Address,
        index: LogIndex,
        hash: LogHash,
        today: Day,
        registry: &dyn ValidatorRegistry,
        stake: &dyn StakeView,
    ) -> Result<Vec<ConsensusEvent>, TesseraError> {
        let validator = Self::resolve_validator(caller, registry)?;
        self.record_vote(validator, index, hash, today)?;
        self.advance(today, registry, stake)
    }

    /// Advance the caller's pointer by one, re-using its last hash.
    pub fn carry_forward(
        &mut self,
        caller: &Address,
        today: Day,
        registry: &dyn ValidatorRegistry,
        stake: &dyn StakeView,
    ) -> Result<Vec<ConsensusEvent>, TesseraError> {
        let validator = Self::resolve_validator(caller, registry)?;
        let (Some(pointer), Some(hash)) = (
            self.pointers.get(&validator).copied(),
            self.last_hash.get(&validator).copied(),
        ) else {
            return Err(TesseraError::NothingToCarryForward);
        };
        let index = match self.live_pointer(&validator) {
            Some(_) => pointer + 1,
            None => self.next_unfinalized,
        };
        self.record_vote(validator, index, hash, today)?;
        self.advance(today, registry, stake)
    }

    /// Pointer of `validator`, unless finalization has already moved past
    /// the index it would advance to. A validator that sat out while disabled
    /// resumes at any unfinalized index.
    fn live_pointer(&self, validator: &Address) -> Option<LogIndex> {
        self.pointers
            .get(validator)
            .copied()
            .filter(|p| p + 1 >= self.next_unfinalized)
    }

    fn record_vote(
        &mut self,
        validator: Address,
        index: LogIndex,
        hash: LogHash,
        today: Day,
    ) -> Result<(), TesseraError> {
        if index > today {
            return Err(TesseraError::IndexNotReached { index, today });
        }
        if index < self.next_unfinalized {
            return Err(TesseraError::IndexFinalized(index));
        }
        if let Some(pointer) = self.live_pointer(&validator) {
            if index < pointer {
                return Err(TesseraError::IndexInPast { index, pointer });
            }
            if index > pointer + 1 {
                return Err(TesseraError::IndexSkipsAhead { index, pointer });
            }
        }

        self.votes.entry(index).or_default().insert(
            validator,
            Submission {
                hash,
                submitted_on: today,
            },
        );
        self.pointers.insert(validator, index);
        self.last_hash.insert(validator, hash);
        self.frontier = Some(self.frontier.map_or(index, |f| f.max(index)));
        debug!(validator = %validator, index, hash = %hash, day = today, "hash submitted");
        Ok(())
    }

    /// Finalize every index whose inputs can no longer change.
    ///
    /// Validators registered after an index's day are not waited on for it.
    pub fn advance(
        &mut self,
        today: Day,
        registry: &dyn ValidatorRegistry,
        stake: &dyn StakeView,
    ) -> Result<Vec<ConsensusEvent>, TesseraError> {
        let mut events = Vec::new();
        let required = registry.active_validators();
        while let Some(frontier) = self.frontier {
            let index = self.next_unfinalized;
            if index >= frontier {
                break;
            }
            let ready = required
                .iter()
                .filter(|v| registry.registered_on(v).is_some_and(|d| d <= index))
                .all(|v| self.pointers.get(v).is_some_and(|p| *p > index));
            if !ready {
                break;
            }
            events.extend(self.finalize(index, today, stake));
            self.next_unfinalized = index + 1;
        }
        Ok(events)
    }

    fn finalize(&mut self, index: LogIndex, today: Day, stake: &dyn StakeView) -> Vec<ConsensusEvent> {
        let Some(ballots) = self.votes.get(&index) else {
            debug!(index, "index finalized without submissions");
            return vec![ConsensusEvent::Finalized {
                index,
                has_majority: false,
            }];
        };
        let votes: BTreeMap<Address, LogHash> =
            ballots.iter().map(|(v, s)| (*v, s.hash)).collect();
        let majority = compute_majority(&votes, |v| stake.delegated_total_as_of(index, v));
        let has_majority = majority.has_majority();
        info!(
            index,
            has_majority,
            hash = %majority.hash,
            weight = majority.total_weight,
            submitters = majority.all_submitters.len(),
            "index finalized"
        );
        self.records.insert(
            index,
            IndexRecord {
                majority,
                finalized_on: today,
                winner: None,
                random_value: None,
            },
        );

        let mut events = vec![ConsensusEvent::Finalized { index, has_majority }];
        if has_majority {
            let request_id = self.open_request(index, today);
            self.pending.insert(
                index,
                RandomnessRequest {
                    index,
                    requested_day: today,
                    latest_request_id: request_id,
                },
            );
            events.push(ConsensusEvent::RandomnessRequested { request_id, index });
        }
        events
    }

    fn open_request(&mut self, index: LogIndex, today: Day) -> u64 {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.requests.insert(request_id, index);
        info!(request_id, index, day = today, "randomness requested");
        request_id
    }

    fn is_expired(&self, request: &RandomnessRequest, today: Day) -> bool {
        today >= request.requested_day.saturating_add(self.randomness_timeout)
    }

    /// Issue a fresh request id for an index still waiting on randomness.
    /// The deadline keeps counting from the first request.
    pub fn retry_randomness(&mut self, index: LogIndex, today: Day) -> Result<u64, TesseraError> {
        let request = self
            .pending
            .get(&index)
            .cloned()
            .ok_or(TesseraError::RandomnessNotPending(index))?;
        if self.is_expired(&request, today) {
            return Err(TesseraError::RandomnessExpired {
                index,
                requested_day: request.requested_day,
            });
        }
        let request_id = self.open_request(index, today);
        if let Some(r) = self.pending.get_mut(&index) {
            r.latest_request_id = request_id;
        }
        Ok(request_id)
    }

    /// Deliver randomness for `request_id` and draw the winner.
    ///
    /// Any request id issued for the index is accepted; the first delivery
    /// decides it.
    pub fn fulfill_randomness(
        &mut self,
        request_id: u64,
        random_value: u128,
        today: Day,
    ) -> Result<Address, TesseraError> {
        let index = *self
            .requests
            .get(&request_id)
            .ok_or(TesseraError::UnknownRandomnessRequest(request_id))?;
        let request = self
            .pending
            .get(&index)
            .cloned()
            .ok_or(TesseraError::RandomnessNotPending(index))?;
        if self.is_expired(&request, today) {
            warn!(index, request_id, day = today, "late randomness rejected");
            return Err(TesseraError::RandomnessExpired {
                index,
                requested_day: request.requested_day,
            });
        }
        let record = self
            .records
            .get_mut(&index)
            .ok_or(TesseraError::RandomnessNotPending(index))?;
        let winner = pick_winner(&record.majority.majority_submitters, random_value)
            .ok_or(TesseraError::RandomnessNotPending(index))?;
        record.winner = Some(winner);
        record.random_value = Some(random_value);
        self.pending.remove(&index);
        self.decided.insert(index);
        info!(index, request_id, winner = %winner, day = today, "winner selected");
        Ok(winner)
    }

    /// `(hash, majoritySubmitters, allSubmitters, totalWeight)` for `index`.
    ///
    /// Frozen once the index is finalized; before that it is computed from the
    /// votes cast so far.
    pub fn get_majority(&self, index: LogIndex, stake: &dyn StakeView) -> MajorityRecord {
        if let Some(record) = self.records.get(&index) {
            return record.majority.clone();
        }
        let votes: BTreeMap<Address, LogHash> = self
            .votes
            .get(&index)
            .filter(|_| index >= self.next_unfinalized)
            .map(|b| b.iter().map(|(v, s)| (*v, s.hash)).collect())
            .unwrap_or_default();
        compute_majority(&votes, |v| stake.delegated_total_as_of(index, v))
    }

    /// `(winnerAddress, status)` for `index` as seen on `today`.
    pub fn get_winner(&self, index: LogIndex, today: Day) -> (Address, WinnerStatus) {
        let outcome = self.outcome(index, today);
        (outcome.winner(), outcome.status())
    }

    pub fn pointer_of(&self, validator: &Address) -> Option<LogIndex> {
        self.pointers.get(validator).copied()
    }

    pub fn submissions_for(&self, index: LogIndex) -> Vec<(Address, Submission)> {
        self.votes
            .get(&index)
            .map(|b| b.iter().map(|(a, s)| (*a, *s)).collect())
            .unwrap_or_default()
    }

    pub fn record(&self, index: LogIndex) -> Option<&IndexRecord> {
        self.records.get(&index)
    }

    pub fn next_unfinalized(&self) -> LogIndex {
        self.next_unfinalized
    }

    pub fn frontier(&self) -> Option<LogIndex> {
        self.frontier
    }

    /// Requests still awaiting randomness and not yet past their deadline.
    pub fn pending_requests(&self, today: Day) -> Vec<RandomnessRequest> {
        self.pending
            .values()
            .filter(|r| !self.is_expired(r, today))
            .cloned()
            .collect()
    }

    pub fn randomness_timeout(&self) -> u64 {
        self.randomness_timeout
    }
}

impl OutcomeView for ConsensusEngine {
    fn outcome(&self, index: LogIndex, today: Day) -> DayOutcome {
        if index < self.next_unfinalized {
            let Some(record) = self.records.get(&index) else {
                return DayOutcome::NoSubmissionToday;
            };
            if !record.majority.has_majority() {
                return DayOutcome::NoMajority;
            }
            if let Some(winner) = record.winner {
                return DayOutcome::Decided {
                    winner,
                    hash: record.majority.hash,
                };
            }
            return match self.pending.get(&index) {
                Some(r) if self.is_expired(r, today) => DayOutcome::Abandoned,
                _ => DayOutcome::Pending,
            };
        }
        let begun = self.frontier.is_some_and(|f| index < f);
        if !begun || index > today {
            return DayOutcome::NoWinnerForFutureDate;
        }
        DayOutcome::Pending
    }

    fn decided_at_or_before(&self, index: LogIndex, limit: usize) -> Vec<LogIndex> {
        self.decided
            .range(..=index)
            .rev()
            .take(limit)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidatorSet;
    use tessera_core::account::TokenBalances;
    use tessera_stake::StakeLedger;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    fn hash(b: u8) -> LogHash {
        LogHash([b; 32])
    }

    struct Net {
        validators: ValidatorSet,
        stake: StakeLedger,
        engine: ConsensusEngine,
    }

    impl Net {
        /// Validators 1..=n, each backed on day 0 by a delegator with the
        /// given weight.
        fn new(weights: &[u128]) -> Self {
            let mut validators = ValidatorSet::default();
            let mut stake = StakeLedger::default();
            let mut tokens = TokenBalances::new();
            for (i, w) in weights.iter().enumerate() {
                let v = addr(i as u8 + 1);
                let d = addr(i as u8 + 101);
                validators.add(v, v, 0, 0).unwrap();
                tokens.mint(&d, *w).unwrap();
                stake
                    .lock_and_delegate(&d, *w, &v, 0, &validators, &mut tokens)
                    .unwrap();
            }
            Self {
                validators,
                stake,
                engine: ConsensusEngine::default(),
            }
        }

        fn submit(&mut self, v: u8, index: LogIndex, h: u8, today: Day) -> Vec<ConsensusEvent> {
            self.engine
                .submit(&addr(v), index, hash(h), today, &self.validators, &self.stake)
                .unwrap()
        }

        fn request_for(events: &[ConsensusEvent]) -> Option<u64> {
            events.iter().find_map(|e| match e {
                ConsensusEvent::RandomnessRequested { request_id, .. } => Some(*request_id),
                _ => None,
            })
        }
    }

    #[test]
    fn divergent_then_aligned_submissions() {
        let mut net = Net::new(&[1, 1, 1]);
        net.submit(1, 0, 0xA, 0);
        net.submit(2, 0, 0xB, 0);
        net.submit(3, 0, 0xC, 0);
        assert!(!net.engine.get_majority(0, &net.stake).has_majority());
        assert_eq!(net.engine.outcome(0, 0), DayOutcome::NoWinnerForFutureDate);

        // Validator 2 revotes for index 0 on day 1 and joins validator 1.
        net.submit(2, 0, 0xA, 1);
        let live = net.engine.get_majority(0, &net.stake);
        assert_eq!(live.hash, hash(0xA));
        assert_eq!(live.total_weight, 2);

        net.submit(1, 1, 0xD, 1);
        net.submit(2, 1, 0xD, 1);
        assert_eq!(net.engine.outcome(0, 1), DayOutcome::Pending);
        let events = net.submit(3, 1, 0xD, 1);
        let request_id = Net::request_for(&events).expect("randomness requested");

        let frozen = net.engine.get_majority(0, &net.stake);
        assert_eq!(frozen.majority_addresses(), vec![addr(1), addr(2)]);
        assert_eq!(frozen.all_submitters, vec![addr(1), addr(2), addr(3)]);
        assert_eq!(net.engine.get_winner(0, 1), (Address::ZERO, WinnerStatus::Pending));

        let winner = net.engine.fulfill_randomness(request_id, 12345, 2).unwrap();
        assert!(winner == addr(1) || winner == addr(2));
        assert_eq!(
            net.engine.outcome(0, 2),
            DayOutcome::Decided {
                winner,
                hash: hash(0xA)
            }
        );
        assert_eq!(net.engine.decided_at_or_before(5, 10), vec![0]);
    }

    #[test]
    fn tie_finalizes_as_no_majority() {
        let mut net = Net::new(&[1, 1]);
        net.submit(1, 0, 1, 0);
        net.submit(2, 0, 2, 0);
        net.submit(1, 1, 3, 1);
        let events = net.submit(2, 1, 3, 1);
        assert_eq!(
            events,
            vec![ConsensusEvent::Finalized {
                index: 0,
                has_majority: false
            }]
        );
        assert_eq!(net.engine.outcome(0, 1), DayOutcome::NoMajority);
        assert!(net.engine.record(0).unwrap().majority.all_submitters.len() == 2);
    }

    #[test]
    fn weight_is_taken_from_the_index_day() {
        let mut net = Net::new(&[10, 30]);
        net.submit(1, 0, 1, 0);
        net.submit(2, 0, 2, 0);
        // Validator 1 becomes heavier on day 1; index 0 still uses day 0 stake.
        let mut tokens = TokenBalances::new();
        tokens.mint(&addr(200), 100).unwrap();
        net.stake
            .lock_and_delegate(&addr(200), 100, &addr(1), 1, &net.validators, &mut tokens)
            .unwrap();
        net.submit(1, 1, 1, 1);
        net.submit(2, 1, 1, 1);
        let m = net.engine.get_majority(0, &net.stake);
        assert_eq!(m.hash, hash(2));
        assert_eq!(m.total_weight, 30);
    }

    #[test]
    fn empty_indices_finalize_as_no_submission() {
        let mut net = Net::new(&[1]);
        net.submit(1, 3, 1, 3);
        net.submit(1, 4, 1, 4);
        for i in 0..3 {
            assert_eq!(net.engine.outcome(i, 4), DayOutcome::NoSubmissionToday);
        }
        assert_eq!(net.engine.outcome(3, 4), DayOutcome::Pending);
        assert_eq!(net.engine.next_unfinalized(), 4);
    }

    #[test]
    fn abandonment_boundary() {
        let mut net = Net::new(&[1, 1]);
        net.submit(1, 0, 1, 0);
        net.submit(2, 0, 1, 0);
        net.submit(1, 1, 1, 1);
        let events = net.submit(2, 1, 1, 1);
        let request_id = Net::request_for(&events).unwrap();

        // Requested on day 1: still pending through day 30, abandoned on 31.
        assert_eq!(net.engine.outcome(0, 30), DayOutcome::Pending);
        assert_eq!(net.engine.outcome(0, 31), DayOutcome::Abandoned);

        let mut late = net.engine.clone();
        assert!(matches!(
            late.fulfill_randomness(request_id, 7, 31),
            Err(TesseraError::RandomnessExpired { index: 0, requested_day: 1 })
        ));

        // Delivered 29 days after the request: decided.
        net.engine.fulfill_randomness(request_id, 7, 30).unwrap();
        assert_eq!(net.engine.get_winner(0, 100).1, WinnerStatus::Decided);
    }

    #[test]
    fn retry_keeps_original_deadline() {
        let mut net = Net::new(&[1]);
        net.submit(1, 0, 1, 0);
        let events = net.submit(1, 1, 1, 1);
        let first = Net::request_for(&events).unwrap();

        let second = net.engine.retry_randomness(0, 20).unwrap();
        assert_ne!(first, second);
        assert_eq!(net.engine.pending_requests(20)[0].latest_request_id, second);
        assert!(matches!(
            net.engine.retry_randomness(0, 31),
            Err(TesseraError::RandomnessExpired { .. })
        ));

        net.engine.fulfill_randomness(second, 1, 21).unwrap();
        assert!(matches!(
            net.engine.fulfill_randomness(first, 1, 21),
            Err(TesseraError::RandomnessNotPending(0))
        ));
        assert!(matches!(
            net.engine.fulfill_randomness(99, 1, 21),
            Err(TesseraError::UnknownRandomnessRequest(99))
        ));
    }

    #[test]
    fn pointer_rules() {
        let mut net = Net::new(&[1, 1]);
        net.submit(1, 2, 1, 2);
        let e = &mut net.engine;
        let (vs, st) = (&net.validators, &net.stake);
        assert!(matches!(
            e.submit(&addr(1), 4, hash(1), 5, vs, st),
            Err(TesseraError::IndexSkipsAhead { index: 4, pointer: 2 })
        ));
        assert!(matches!(
            e.submit(&addr(1), 1, hash(1), 5, vs, st),
            Err(TesseraError::IndexInPast { index: 1, pointer: 2 })
        ));
        assert!(matches!(
            e.submit(&addr(1), 3, hash(1), 2, vs, st),
            Err(TesseraError::IndexNotReached { index: 3, today: 2 })
        ));
        assert!(matches!(
            e.submit(&addr(9), 2, hash(1), 2, vs, st),
            Err(TesseraError::NotValidator(_))
        ));
        // Resubmission on the current pointer overwrites the vote.
        e.submit(&addr(1), 2, hash(7), 3, vs, st).unwrap();
        assert_eq!(e.submissions_for(2)[0].1.hash, hash(7));
        assert_eq!(e.submissions_for(2)[0].1.submitted_on, 3);
    }

    #[test]
    fn disabled_validator_cannot_submit_and_stops_blocking() {
        let mut net = Net::new(&[1, 1]);
        net.submit(1, 0, 1, 0);
        net.submit(1, 1, 1, 1);
        assert_eq!(net.engine.next_unfinalized(), 0);

        net.validators.set_enabled(&addr(2), false).unwrap();
        assert!(matches!(
            net.engine
                .submit(&addr(2), 0, hash(1), 1, &net.validators, &net.stake),
            Err(TesseraError::ValidatorDisabled(_))
        ));
        let events = net.engine.advance(1, &net.validators, &net.stake).unwrap();
        assert!(Net::request_for(&events).is_some());
        assert!(matches!(
            net.engine
                .submit(&addr(1), 0, hash(1), 1, &net.validators, &net.stake),
            Err(TesseraError::IndexFinalized(0))
        ));
    }

    #[test]
    fn re_enabled_validator_rejoins_past_finalized_indices() {
        let mut net = Net::new(&[1, 1]);
        net.submit(1, 0, 1, 0);
        net.submit(2, 0, 1, 0);
        net.validators.set_enabled(&addr(2), false).unwrap();
        for index in 1..=3 {
            net.submit(1, index, 1, index);
        }
        assert_eq!(net.engine.next_unfinalized(), 3);
        assert_eq!(net.engine.pointer_of(&addr(2)), Some(0));

        net.validators.set_enabled(&addr(2), true).unwrap();
        // Finalized indices stay closed.
        assert!(matches!(
            net.engine
                .submit(&addr(2), 1, hash(1), 3, &net.validators, &net.stake),
            Err(TesseraError::IndexFinalized(1))
        ));
        net.submit(2, 3, 1, 3);
        assert_eq!(net.engine.pointer_of(&addr(2)), Some(3));

        net.submit(1, 4, 1, 4);
        net.submit(2, 4, 1, 4);
        net.submit(1, 5, 1, 5);
        net.submit(2, 5, 1, 5);
        assert_eq!(net.engine.next_unfinalized(), 5);
    }

    #[test]
    fn stale_pointer_carries_forward_to_first_open_index() {
        let mut net = Net::new(&[1, 1]);
        net.submit(1, 0, 1, 0);
        net.submit(2, 0, 9, 0);
        net.validators.set_enabled(&addr(2), false).unwrap();
        net.submit(1, 1, 1, 1);
        net.submit(1, 2, 1, 2);
        assert_eq!(net.engine.next_unfinalized(), 2);

        net.validators.set_enabled(&addr(2), true).unwrap();
        net.engine
            .carry_forward(&addr(2), 2, &net.validators, &net.stake)
            .unwrap();
        assert_eq!(net.engine.pointer_of(&addr(2)), Some(2));
        assert_eq!(net.engine.submissions_for(2).len(), 2);

        net.submit(1, 3, 1, 3);
        net.submit(2, 3, 1, 3);
        assert_eq!(net.engine.next_unfinalized(), 3);
    }

    #[test]
    fn carry_forward_reuses_last_hash() {
        let mut net = Net::new(&[1]);
        assert!(matches!(
            net.engine.carry_forward(&addr(1), 0, &net.validators, &net.stake),
            Err(TesseraError::NothingToCarryForward)
        ));
        net.submit(1, 0, 0x42, 0);
        net.engine
            .carry_forward(&addr(1), 1, &net.validators, &net.stake)
            .unwrap();
        assert_eq!(net.engine.pointer_of(&addr(1)), Some(1));
        assert_eq!(net.engine.submissions_for(1)[0].1.hash, hash(0x42));
        assert!(net.engine.record(0).is_some());
    }

    #[test]
    fn submitter_proxy_votes_for_its_validator() {
        let mut net = Net::new(&[1]);
        net.validators.add(addr(50), addr(51), 0, 0).unwrap();
        net.engine
            .submit(&addr(51), 0, hash(3), 0, &net.validators, &net.stake)
            .unwrap();
        assert_eq!(net.engine.pointer_of(&addr(50)), Some(0));
        assert_eq!(net.engine.pointer_of(&addr(51)), None);
    }

    #[test]
    fn late_registered_validator_does_not_block_earlier_indices() {
        let mut net = Net::new(&[1]);
        net.submit(1, 0, 1, 0);
        net.validators.add(addr(60), addr(60), 0, 1).unwrap();
        let events = net.submit(1, 1, 1, 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, ConsensusEvent::Finalized { index: 0, .. })));
        // Index 1 now waits on both validators.
        net.submit(1, 2, 1, 2);
        assert_eq!(net.engine.next_unfinalized(), 1);
    }
}
