use tessera_core::error::TesseraError;
use tessera_core::transaction::{body_bytes, Action, Transaction};
use tessera_core::types::Nonce;

use crate::dilithium::verify_signature;
use crate::hash::{address_from_pubkey, tx_id_from_body};
use crate::keypair::KeyPair;

/// Build and sign a transaction from `keypair`.
pub fn sign_transaction(
    keypair: &KeyPair,
    nonce: Nonce,
    action: Action,
) -> Result<Transaction, TesseraError> {
    let body = body_bytes(nonce, &keypair.address, &action)?;
    let signature = keypair
        .sign(&body)
        .map_err(|_| TesseraError::InvalidSignature)?;
    Ok(Transaction {
        tx_id: tx_id_from_body(&body),
        nonce,
        from: keypair.address,
        action,
        public_key: keypair.public_key.clone(),
        signature,
    })
}

/// Check the id, sender binding and signature of `tx`.
pub fn verify_transaction(tx: &Transaction) -> Result<(), TesseraError> {
    if address_from_pubkey(&tx.public_key.0) != tx.from {
        return Err(TesseraError::SenderKeyMismatch);
    }
    let body = tx.body_bytes()?;
    if tx_id_from_body(&body) != tx.tx_id {
        return Err(TesseraError::InvalidSignature);
    }
    verify_signature(&tx.public_key, &body, &tx.signature)
        .map_err(|_| TesseraError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::types::Address;

    #[test]
    fn signed_transaction_verifies() {
        let kp = KeyPair::generate();
        let tx = sign_transaction(&kp, 0, Action::Unlock { amount: 5 }).unwrap();
        verify_transaction(&tx).unwrap();
    }

    #[test]
    fn altered_action_is_rejected() {
        let kp = KeyPair::generate();
        let mut tx = sign_transaction(&kp, 0, Action::Unlock { amount: 5 }).unwrap();
        tx.action = Action::Unlock { amount: 500 };
        assert!(verify_transaction(&tx).is_err());
    }

    #[test]
    fn foreign_sender_is_rejected() {
        let kp = KeyPair::generate();
        let mut tx = sign_transaction(&kp, 0, Action::CarryForward).unwrap();
        tx.from = Address::from_bytes([4; 32]);
        assert!(matches!(verify_transaction(&tx), Err(TesseraError::SenderKeyMismatch)));
    }
}
