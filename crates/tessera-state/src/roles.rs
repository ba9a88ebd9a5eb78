use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use tessera_core::error::TesseraError;
use tessera_core::transaction::Role;
use tessera_core::types::Address;

/// Owner, role membership and the standing ticket signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roles {
    owner: Address,
    members: BTreeMap<Role, BTreeSet<Address>>,
    ticket_signer: Address,
}

impl Roles {
    pub fn new(owner: Address, ticket_signer: Address) -> Self {
        Self {
            owner,
            members: BTreeMap::new(),
            ticket_signer,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Address whose signature authorizes ephemeral ticket signers.
    pub fn ticket_signer(&self) -> Address {
        self.ticket_signer
    }

    pub fn require_owner(&self, caller: &Address) -> Result<(), TesseraError> {
        if *caller != self.owner {
            return Err(TesseraError::MissingRole("owner"));
        }
        Ok(())
    }

    pub fn has(&self, role: Role, account: &Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|set| set.contains(account))
    }

    pub fn require(&self, role: Role, account: &Address) -> Result<(), TesseraError> {
        if !self.has(role, account) {
            return Err(TesseraError::MissingRole(role.name()));
        }
        Ok(())
    }

    /// Returns false if the account already held the role.
    pub fn grant(&mut self, role: Role, account: Address) -> bool {
        let added = self.members.entry(role).or_default().insert(account);
        if added {
            info!(role = %role, account = %account, "role granted");
        }
        added
    }

    /// Returns false if the account did not hold the role.
    pub fn revoke(&mut self, role: Role, account: &Address) -> bool {
        let removed = self
            .members
            .get_mut(&role)
            .is_some_and(|set| set.remove(account));
        if removed {
            info!(role = %role, account = %account, "role revoked");
        }
        removed
    }

    pub fn members(&self, role: Role) -> Vec<Address> {
        self.members
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn set_ticket_signer(&mut self, signer: Address) {
        info!(previous = %self.ticket_signer, signer = %signer, "ticket signer rotated");
        self.ticket_signer = signer;
    }
}
