use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tessera_core::types::{Address, Amount, LogHash};

/// Result of a majority computation for one log index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityRecord {
    /// `LogHash::EMPTY` when there is no majority.
    pub hash: LogHash,
    /// Validators that submitted `hash`, by address, with their weight.
    pub majority_submitters: Vec<(Address, Amount)>,
    /// Every validator with a vote on the index, by address.
    pub all_submitters: Vec<Address>,
    /// Combined weight behind `hash`.
    pub total_weight: Amount,
}

impl MajorityRecord {
    pub fn has_majority(&self) -> bool {
        !self.hash.is_empty()
    }

    pub fn majority_addresses(&self) -> Vec<Address> {
        self.majority_submitters.iter().map(|(a, _)| *a).collect()
    }
}

/// Plurality over stake weight.
///
/// Votes are grouped by hash and each group's weight summed. The group with
/// the strictly highest weight wins, whatever its share of the total. A tie
/// for first place, or no votes at all, gives no majority.
pub fn compute_majority<F>(votes: &BTreeMap<Address, LogHash>, weight_of: F) -> MajorityRecord
where
    F: Fn(&Address) -> Amount,
{
    let mut groups: BTreeMap<LogHash, Vec<(Address, Amount)>> = BTreeMap::new();
    for (validator, hash) in votes {
        groups
            .entry(*hash)
            .or_default()
            .push((*validator, weight_of(validator)));
    }

    let mut best: Option<(LogHash, Amount)> = None;
    let mut tied = false;
    for (hash, members) in &groups {
        let weight = members.iter().fold(0u128, |acc, (_, w)| acc.saturating_add(*w));
        match best {
            Some((_, top)) if weight == top => tied = true,
            Some((_, top)) if weight < top => {}
            _ => {
                best = Some((*hash, weight));
                tied = false;
            }
        }
    }

    let all_submitters = votes.keys().copied().collect();
    match best {
        Some((hash, total_weight)) if !tied => MajorityRecord {
            hash,
            majority_submitters: groups.remove(&hash).unwrap_or_default(),
            all_submitters,
            total_weight,
        },
        _ => MajorityRecord {
            hash: LogHash::EMPTY,
            majority_submitters: Vec::new(),
            all_submitters,
            total_weight: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    fn hash(b: u8) -> LogHash {
        LogHash([b; 32])
    }

    fn weights(w: &[(u8, Amount)]) -> impl Fn(&Address) -> Amount + '_ {
        move |a| {
            w.iter()
                .find(|(b, _)| addr(*b) == *a)
                .map(|(_, w)| *w)
                .unwrap_or(0)
        }
    }

    #[test]
    fn equal_weights_divergent_hashes_tie() {
        let votes = BTreeMap::from([(addr(1), hash(1)), (addr(2), hash(2)), (addr(3), hash(3))]);
        let m = compute_majority(&votes, weights(&[(1, 1), (2, 1), (3, 1)]));
        assert!(!m.has_majority());
        assert_eq!(m.hash, LogHash::EMPTY);
        assert_eq!(m.all_submitters.len(), 3);
        assert!(m.majority_submitters.is_empty());
    }

    #[test]
    fn strict_leader_wins_without_half() {
        // 40 vs 35 vs 25: no group holds more than half, the leader still wins.
        let votes = BTreeMap::from([(addr(1), hash(1)), (addr(2), hash(2)), (addr(3), hash(3))]);
        let m = compute_majority(&votes, weights(&[(1, 40), (2, 35), (3, 25)]));
        assert_eq!(m.hash, hash(1));
        assert_eq!(m.majority_addresses(), vec![addr(1)]);
        assert_eq!(m.total_weight, 40);
    }

    #[test]
    fn heavier_single_submitter_beats_two_lighter() {
        let votes = BTreeMap::from([(addr(1), hash(7)), (addr(2), hash(7)), (addr(3), hash(9))]);
        let m = compute_majority(&votes, weights(&[(1, 10), (2, 10), (3, 25)]));
        assert_eq!(m.hash, hash(9));
        assert_eq!(m.total_weight, 25);
    }

    #[test]
    fn aligned_pair_wins() {
        let votes = BTreeMap::from([(addr(1), hash(1)), (addr(2), hash(1)), (addr(3), hash(3))]);
        let m = compute_majority(&votes, weights(&[(1, 1), (2, 1), (3, 1)]));
        assert_eq!(m.hash, hash(1));
        assert_eq!(m.majority_addresses(), vec![addr(1), addr(2)]);
        assert_eq!(m.total_weight, 2);
    }

    #[test]
    fn tie_below_leader_does_not_matter() {
        let votes = BTreeMap::from([(addr(1), hash(1)), (addr(2), hash(2)), (addr(3), hash(3))]);
        let m = compute_majority(&votes, weights(&[(1, 5), (2, 5), (3, 9)]));
        assert_eq!(m.hash, hash(3));
    }

    #[test]
    fn no_votes_no_majority() {
        let m = compute_majority(&BTreeMap::new(), |_| 0);
        assert!(!m.has_majority());
        assert!(m.all_submitters.is_empty());
    }

    #[test]
    fn single_group_wins_at_zero_weight() {
        let votes = BTreeMap::from([(addr(1), hash(1))]);
        let m = compute_majority(&votes, |_| 0);
        assert_eq!(m.hash, hash(1));
        assert_eq!(m.total_weight, 0);
    }
}
