//! tessera-genesis
//!
//! Builds the initial protocol state from `GenesisParams` and writes it into
//! an empty `StateDb`. This is the only place tokens are created; validators
//! and roles set up here are registered on day 0.

pub mod params;

pub use params::{Allocation, GenesisParams, GenesisValidator, RoleGrant};

use tessera_core::error::TesseraError;
use tessera_core::interfaces::TokenLedger;
use tessera_state::{ProtocolState, StateDb};
use tracing::info;

use crate::params::parse_address;

const GENESIS_META_KEY: &str = "genesis_applied";

/// Whether `db` already holds a genesis state.
pub fn is_applied(db: &StateDb) -> Result<bool, TesseraError> {
    Ok(db.get_meta(GENESIS_META_KEY)?.is_some())
}

/// Build the genesis state without persisting it.
pub fn build_genesis(params: &GenesisParams) -> Result<ProtocolState, TesseraError> {
    let owner = parse_address("owner", &params.owner)?;
    let ticket_signer = parse_address("ticket_signer", &params.ticket_signer)?;
    let mut state = ProtocolState::new(params.config.clone(), owner, ticket_signer)?;

    // ── Balances ─────────────────────────────────────────────────────────────
    for alloc in &params.balances {
        let account = parse_address("balance", &alloc.account)?;
        state.tokens.mint(&account, alloc.amount)?;
        info!(account = %account, amount = alloc.amount, "genesis: allocation");
    }

    // ── Validators ───────────────────────────────────────────────────────────
    for v in &params.validators {
        let address = parse_address("validator", &v.address)?;
        let submitter = match &v.submitter {
            Some(s) => parse_address("submitter", s)?,
            None => address,
        };
        state.validators.add(address, submitter, v.commission_rate, 0)?;
    }

    // ── Roles ────────────────────────────────────────────────────────────────
    for grant in &params.roles {
        let account = parse_address("role", &grant.account)?;
        state.roles.grant(grant.role, account);
    }

    info!(
        owner = %owner,
        accounts = state.tokens.len(),
        validators = params.validators.len(),
        supply = state.tokens.total_supply(),
        "genesis state built"
    );
    Ok(state)
}

/// Build the genesis state and commit it to an empty `db`.
pub fn apply_genesis(db: &StateDb, params: &GenesisParams) -> Result<ProtocolState, TesseraError> {
    if is_applied(db)? {
        return Err(TesseraError::Other("genesis already applied".into()));
    }
    info!("applying Tessera genesis state");
    let state = build_genesis(params)?;
    db.put_state(&state)?;
    db.put_meta(GENESIS_META_KEY, &[1])?;
    db.flush()?;
    info!(
        owner_balance = state.tokens.balance_of(&state.roles.owner()),
        "genesis state committed to disk"
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::constants::ONE_TOKEN;
    use tessera_core::interfaces::ValidatorRegistry;
    use tessera_core::transaction::Role;
    use tessera_core::types::Address;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("tessera_genesis_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn b58(b: u8) -> String {
        Address::from_bytes([b; 32]).to_b58()
    }

    fn params() -> GenesisParams {
        let json = format!(
            r#"{{
                "config": {{ "unlock_holding_days": 10 }},
                "owner": "{owner}",
                "ticket_signer": "{signer}",
                "balances": [ {{ "account": "{alice}", "amount": 5000000000000000000 }} ],
                "validators": [ {{ "address": "{v}", "submitter": "{s}", "commission_rate": 100000000000000000 }} ],
                "roles": [ {{ "role": "PoolMaintainer", "account": "{owner}" }} ]
            }}"#,
            owner = b58(1),
            signer = b58(2),
            alice = b58(3),
            v = b58(4),
            s = b58(5),
        );
        GenesisParams::from_json(&json).unwrap()
    }

    #[test]
    fn genesis_builds_state_from_json() {
        let db = temp_db("build");
        let state = apply_genesis(&db, &params()).unwrap();

        assert_eq!(state.config.unlock_holding_days, 10);
        assert_eq!(state.balance_of(&Address::from_bytes([3; 32])), 5 * ONE_TOKEN);
        assert_eq!(state.roles.ticket_signer(), Address::from_bytes([2; 32]));
        assert!(state.roles.has(Role::PoolMaintainer, &Address::from_bytes([1; 32])));
        assert_eq!(
            state.validators.validator_for_caller(&Address::from_bytes([5; 32])),
            Some(Address::from_bytes([4; 32]))
        );

        let stored = db.get_state().unwrap().unwrap();
        assert_eq!(stored.tokens.total_supply(), 5 * ONE_TOKEN);
    }

    #[test]
    fn genesis_applies_once() {
        let db = temp_db("once");
        apply_genesis(&db, &params()).unwrap();
        assert!(is_applied(&db).unwrap());
        assert!(apply_genesis(&db, &params()).is_err());
    }

    #[test]
    fn bad_address_is_rejected() {
        let mut p = params();
        p.owner = "not-base58!".into();
        assert!(build_genesis(&p).is_err());
    }
}
