use tessera_core::types::{Address, Amount};

/// Stake-weighted pick among `candidates`.
///
/// Candidates must be ordered by address. `random` is reduced modulo the total
/// weight and mapped into cumulative-weight buckets in that order, so each
/// candidate wins with probability weight / total. With zero total weight the
/// pick is uniform. Returns `None` only for an empty candidate list.
pub fn pick_winner(candidates: &[(Address, Amount)], random: u128) -> Option<Address> {
    if candidates.is_empty() {
        return None;
    }
    let total = candidates
        .iter()
        .fold(0u128, |acc, (_, w)| acc.saturating_add(*w));
    if total == 0 {
        let idx = (random % candidates.len() as u128) as usize;
        return Some(candidates[idx].0);
    }

    let target = random % total;
    let mut cumulative: Amount = 0;
    for (address, weight) in candidates {
        cumulative = cumulative.saturating_add(*weight);
        if target < cumulative {
            return Some(*address);
        }
    }
    candidates.last().map(|(a, _)| *a)
}
