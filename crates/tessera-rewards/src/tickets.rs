use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tessera_core::ticket::TicketKind;
use tessera_core::types::{Address, Amount};

/// Who is redeeming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redeemer {
    /// The receiver itself; every ticket must name it.
    Direct(Address),
    /// A meta-transaction worker relaying on receivers' behalf. The role is
    /// checked by the caller before redemption starts.
    Relayed,
}

/// Outcome of one ticket within a redemption call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPayout {
    pub kind: TicketKind,
    pub receiver: Address,
    /// Zero when the ticket did not raise the high-water mark.
    pub paid: Amount,
    pub high_water: Amount,
}

/// Per-kind, per-receiver cumulative amounts already paid out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketBook {
    paid: BTreeMap<(TicketKind, Address), Amount>,
}

impl TicketBook {
    pub fn high_water(&self, kind: TicketKind, receiver: &Address) -> Amount {
        self.paid.get(&(kind, *receiver)).copied().unwrap_or(0)
    }

    /// Raise the mark to `accumulated` and return the delta to pay, or 0 if
    /// the ticket is not above the mark.
    pub fn advance(&mut self, kind: TicketKind, receiver: &Address, accumulated: Amount) -> Amount {
        let mark = self.paid.entry((kind, *receiver)).or_insert(0);
        if accumulated <= *mark {
            return 0;
        }
        let delta = accumulated - *mark;
        *mark = accumulated;
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pays_only_the_increase() {
        let r = Address::from_bytes([1; 32]);
        let mut book = TicketBook::default();
        assert_eq!(book.advance(TicketKind::Staking, &r, 100), 100);
        assert_eq!(book.advance(TicketKind::Staking, &r, 100), 0);
        assert_eq!(book.advance(TicketKind::Staking, &r, 40), 0);
        assert_eq!(book.advance(TicketKind::Staking, &r, 150), 50);
        assert_eq!(book.high_water(TicketKind::Staking, &r), 150);
        assert_eq!(book.high_water(TicketKind::Certified, &r), 0);
    }
}
