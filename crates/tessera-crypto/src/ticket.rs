//! Two-layer delta-ticket authorization.
//!
//! ```text
//!   standing signer ──meta sig──▶ ticket signer ──body sig──▶ (receiver, amount)
//! ```
//!
//! Each link is checked by its own function so either can be exercised in
//! isolation; `verify_ticket` runs both, head first.

use tessera_core::error::TesseraError;
use tessera_core::ticket::{ticket_body_message, ticket_meta_message, DeltaTicket, TicketKind};
use tessera_core::types::{Address, Amount, SignatureEnvelope};

use crate::dilithium::{recover_signer, SignatureError};
use crate::keypair::KeyPair;

/// Check that `standing_signer` authorized the ticket's declared signer.
pub fn verify_head(ticket: &DeltaTicket, standing_signer: &Address) -> Result<(), TesseraError> {
    let msg = ticket_meta_message(&ticket.ticket_signer);
    let head = recover_signer(&msg, &ticket.meta_signature)
        .map_err(|_| TesseraError::InvalidHeadSigner)?;
    if head != *standing_signer {
        return Err(TesseraError::InvalidHeadSigner);
    }
    Ok(())
}

/// Check that the declared ticket signer signed this exact payload.
pub fn verify_body(kind: TicketKind, ticket: &DeltaTicket) -> Result<(), TesseraError> {
    let msg = ticket_body_message(kind, &ticket.receiver, ticket.accumulated_amount);
    let body = recover_signer(&msg, &ticket.body_signature)
        .map_err(|_| TesseraError::InvalidBodySigner)?;
    if body != ticket.ticket_signer {
        return Err(TesseraError::InvalidBodySigner);
    }
    Ok(())
}

pub fn verify_ticket(
    kind: TicketKind,
    ticket: &DeltaTicket,
    standing_signer: &Address,
) -> Result<(), TesseraError> {
    verify_head(ticket, standing_signer)?;
    verify_body(kind, ticket)
}

/// An ephemeral key authorized by the standing signer to issue tickets.
pub struct TicketIssuer {
    key: KeyPair,
    meta_signature: SignatureEnvelope,
}

impl TicketIssuer {
    /// Bind `ephemeral` to `standing` by signing the ephemeral address.
    pub fn authorize(standing: &KeyPair, ephemeral: KeyPair) -> Result<Self, SignatureError> {
        let meta_signature = standing.envelope(&ticket_meta_message(&ephemeral.address))?;
        Ok(Self {
            key: ephemeral,
            meta_signature,
        })
    }

    pub fn address(&self) -> Address {
        self.key.address
    }

    pub fn issue(
        &self,
        kind: TicketKind,
        receiver: Address,
        accumulated_amount: Amount,
    ) -> Result<DeltaTicket, SignatureError> {
        let body = ticket_body_message(kind, &receiver, accumulated_amount);
        Ok(DeltaTicket {
            receiver,
            accumulated_amount,
            ticket_signer: self.key.address,
            meta_signature: self.meta_signature.clone(),
            body_signature: self.key.envelope(&body)?,
        })
    }
}
