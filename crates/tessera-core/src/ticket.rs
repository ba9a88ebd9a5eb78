use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, SignatureEnvelope};

/// Which pool a delta ticket draws on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TicketKind {
    /// Staking-accrual rewards, paid from the staking pool escrow.
    Staking,
    /// Externally-certified rewards, paid from the certified pool.
    Certified,
}

impl TicketKind {
    fn domain(self) -> &'static [u8] {
        match self {
            Self::Staking => b"tessera/ticket-body/staking/v1",
            Self::Certified => b"tessera/ticket-body/certified/v1",
        }
    }
}

/// Signed voucher declaring the cumulative amount owed to `receiver`.
///
/// `meta_signature` is the standing signer's signature over `ticket_signer`;
/// `body_signature` is the ephemeral ticket signer's signature over
/// `(receiver, accumulated_amount)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaTicket {
    pub receiver: Address,
    pub accumulated_amount: Amount,
    pub ticket_signer: Address,
    pub meta_signature: SignatureEnvelope,
    pub body_signature: SignatureEnvelope,
}

/// One entry of a redemption call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketClaim {
    Staking(DeltaTicket),
    Certified(DeltaTicket),
    /// Both kinds at once; the receivers must match.
    Pair {
        staking: DeltaTicket,
        certified: DeltaTicket,
    },
}

impl TicketClaim {
    /// Every `(kind, ticket)` carried by this claim.
    pub fn tickets(&self) -> Vec<(TicketKind, &DeltaTicket)> {
        match self {
            Self::Staking(t) => vec![(TicketKind::Staking, t)],
            Self::Certified(t) => vec![(TicketKind::Certified, t)],
            Self::Pair { staking, certified } => vec![
                (TicketKind::Staking, staking),
                (TicketKind::Certified, certified),
            ],
        }
    }
}

/// Bytes covered by a ticket body signature.
pub fn ticket_body_message(kind: TicketKind, receiver: &Address, accumulated_amount: Amount) -> Vec<u8> {
    let domain = kind.domain();
    let mut msg = Vec::with_capacity(domain.len() + 32 + 16);
    msg.extend_from_slice(domain);
    msg.extend_from_slice(receiver.as_bytes());
    msg.extend_from_slice(&accumulated_amount.to_le_bytes());
    msg
}

/// Bytes covered by a ticket meta (head) signature.
pub fn ticket_meta_message(ticket_signer: &Address) -> Vec<u8> {
    let mut msg = Vec::with_capacity(32 + 32);
    msg.extend_from_slice(b"tessera/ticket-meta/v1");
    msg.extend_from_slice(ticket_signer.as_bytes());
    msg
}
