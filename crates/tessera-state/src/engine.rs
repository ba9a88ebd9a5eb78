use std::sync::Arc;
use tracing::{info, warn};

use tessera_core::error::TesseraError;
use tessera_core::transaction::Transaction;
use tessera_core::types::Day;
use tessera_crypto::verify_transaction;

use crate::db::{StateDb, TxRecord};
use crate::protocol::{ApplyOutcome, ProtocolState};

/// The state transition engine.
///
/// Validates signed transactions and applies them to the in-memory
/// `ProtocolState`, persisting a snapshot after each one. Each `apply` call is
/// atomic: the action runs against a staged copy that replaces the live state
/// only if it succeeds.
pub struct StateEngine {
    pub db: Arc<StateDb>,
    state: ProtocolState,
}

impl StateEngine {
    pub fn new(db: Arc<StateDb>, state: ProtocolState) -> Self {
        Self { db, state }
    }

    /// Resume from the snapshot stored in `db`, if there is one.
    pub fn load(db: Arc<StateDb>) -> Result<Option<Self>, TesseraError> {
        Ok(db.get_state()?.map(|state| Self { db, state }))
    }

    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    /// Validate and apply a transaction as of `today`.
    pub fn apply(&mut self, tx: &Transaction, today: Day) -> Result<ApplyOutcome, TesseraError> {
        // ── Nonce check ──────────────────────────────────────────────────────
        let expected = self.state.nonce_of(&tx.from);
        if tx.nonce != expected {
            return Err(TesseraError::InvalidNonce {
                expected,
                got: tx.nonce,
            });
        }

        // ── Signature validation ─────────────────────────────────────────────
        verify_transaction(tx)?;

        // ── Apply on a staged copy ───────────────────────────────────────────
        let mut staged = self.state.clone();
        let outcome = staged.apply_action(&tx.from, &tx.action, today)?;
        staged.tokens.bump_nonce(&tx.from);

        // ── Commit ───────────────────────────────────────────────────────────
        self.db.put_state(&staged)?;
        self.db.put_transaction(&TxRecord {
            tx: tx.clone(),
            day: today,
            outcome: outcome.clone(),
        })?;
        self.state = staged;

        info!(tx_id = %tx.tx_id, from = %tx.from, day = today, "applied transaction");
        Ok(outcome)
    }

    /// Apply a sequence, logging and skipping rejected transactions. Returns
    /// how many were applied.
    pub fn apply_all<'a, I>(&mut self, txs: I, today: Day) -> usize
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut applied = 0;
        for tx in txs {
            match self.apply(tx, today) {
                Ok(_) => applied += 1,
                Err(e) => warn!(tx_id = %tx.tx_id, error = %e, "transaction rejected"),
            }
        }
        applied
    }

    /// Write the current state out, e.g. after genesis.
    pub fn persist(&self) -> Result<(), TesseraError> {
        self.db.put_state(&self.state)?;
        self.db.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::constants::ONE_TOKEN;
    use tessera_core::interfaces::TokenLedger;
    use tessera_core::transaction::Action;
    use tessera_crypto::{sign_transaction, KeyPair};

    use crate::config::ProtocolConfig;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("tessera_engine_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn make_engine(name: &str, owner: &KeyPair, funded: &[(&KeyPair, u128)]) -> StateEngine {
        let mut state =
            ProtocolState::new(ProtocolConfig::default(), owner.address, owner.address).unwrap();
        for (kp, amount) in funded {
            state.tokens.mint(&kp.address, *amount).unwrap();
        }
        StateEngine::new(Arc::new(temp_db(name)), state)
    }

    #[test]
    fn transfer_applies_and_bumps_nonce() {
        let owner = KeyPair::generate();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let mut engine = make_engine("transfer", &owner, &[(&alice, 10 * ONE_TOKEN)]);

        let tx = sign_transaction(&alice, 0, Action::Transfer { to: bob.address, amount: ONE_TOKEN }).unwrap();
        engine.apply(&tx, 0).unwrap();

        assert_eq!(engine.state().tokens.balance_of(&bob.address), ONE_TOKEN);
        assert_eq!(engine.state().nonce_of(&alice.address), 1);
        assert!(engine.db.transaction_exists(&tx.tx_id));
        let record = engine.db.get_transaction(&tx.tx_id).unwrap().unwrap();
        assert_eq!(record.outcome, ApplyOutcome::Done);
    }

    #[test]
    fn replayed_transaction_is_rejected() {
        let owner = KeyPair::generate();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let mut engine = make_engine("replay", &owner, &[(&alice, 10 * ONE_TOKEN)]);

        let tx = sign_transaction(&alice, 0, Action::Transfer { to: bob.address, amount: ONE_TOKEN }).unwrap();
        engine.apply(&tx, 0).unwrap();
        let err = engine.apply(&tx, 0).unwrap_err();
        assert!(matches!(err, TesseraError::InvalidNonce { expected: 1, got: 0 }));
    }

    #[test]
    fn tampered_transaction_is_rejected() {
        let owner = KeyPair::generate();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let mut engine = make_engine("tampered", &owner, &[(&alice, 10 * ONE_TOKEN)]);

        let mut tx = sign_transaction(&alice, 0, Action::Transfer { to: bob.address, amount: 1 }).unwrap();
        tx.action = Action::Transfer { to: bob.address, amount: 5 * ONE_TOKEN };
        assert!(matches!(engine.apply(&tx, 0).unwrap_err(), TesseraError::InvalidSignature));
        assert_eq!(engine.state().nonce_of(&alice.address), 0);
    }

    #[test]
    fn failed_action_leaves_state_untouched() {
        let owner = KeyPair::generate();
        let alice = KeyPair::generate();
        let mut engine = make_engine("atomic", &owner, &[(&alice, 10 * ONE_TOKEN)]);

        // Unknown validator: the lock must not move any tokens.
        let tx = sign_transaction(
            &alice,
            0,
            Action::LockAndDelegate {
                amount: 5 * ONE_TOKEN,
                validator: owner.address,
            },
        )
        .unwrap();
        assert!(engine.apply(&tx, 0).is_err());
        assert_eq!(engine.state().balance_of(&alice.address), 10 * ONE_TOKEN);
        assert_eq!(engine.state().nonce_of(&alice.address), 0);
        assert!(!engine.db.transaction_exists(&tx.tx_id));
    }

    #[test]
    fn snapshot_survives_reload() {
        let owner = KeyPair::generate();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let mut engine = make_engine("reload", &owner, &[(&alice, 10 * ONE_TOKEN)]);
        let tx = sign_transaction(&alice, 0, Action::Transfer { to: bob.address, amount: 3 }).unwrap();
        engine.apply(&tx, 0).unwrap();

        let reloaded = StateEngine::load(engine.db.clone()).unwrap().unwrap();
        assert_eq!(reloaded.state().balance_of(&bob.address), 3);
        assert_eq!(reloaded.state().nonce_of(&alice.address), 1);
    }

    #[test]
    fn apply_all_skips_rejections() {
        let owner = KeyPair::generate();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let mut engine = make_engine("apply_all", &owner, &[(&alice, 10)]);
        let txs = vec![
            sign_transaction(&alice, 0, Action::Transfer { to: bob.address, amount: 4 }).unwrap(),
            sign_transaction(&alice, 1, Action::Transfer { to: bob.address, amount: 40 }).unwrap(),
            sign_transaction(&alice, 1, Action::Transfer { to: bob.address, amount: 6 }).unwrap(),
        ];
        assert_eq!(engine.apply_all(&txs, 0), 2);
        assert_eq!(engine.state().balance_of(&bob.address), 10);
    }
}
