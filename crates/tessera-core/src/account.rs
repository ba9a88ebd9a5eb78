use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::TesseraError;
use crate::interfaces::TokenLedger;
use crate::types::{Address, Amount, Nonce};

// ── Account ───────────────────────────────────────────────────────────────────

/// Token balance and replay counter for one address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    /// Free (transferable) balance in base units.
    pub balance: Amount,
    /// Next nonce this account must use.
    pub nonce: Nonce,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: 0,
            nonce: 0,
        }
    }
}

// ── TokenBalances ─────────────────────────────────────────────────────────────

/// In-state fungible token ledger. Escrow accounts (stake, reward pools) are
/// ordinary entries keyed by system addresses.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenBalances {
    accounts: BTreeMap<Address, Account>,
}

impl TokenBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    fn entry(&mut self, address: &Address) -> &mut Account {
        self.accounts
            .entry(*address)
            .or_insert_with(|| Account::new(*address))
    }

    /// Create tokens. Only genesis calls this.
    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TesseraError> {
        let acc = self.entry(to);
        acc.balance = acc.balance.checked_add(amount).ok_or(TesseraError::Overflow)?;
        Ok(())
    }

    pub fn nonce_of(&self, address: &Address) -> Nonce {
        self.accounts.get(address).map(|a| a.nonce).unwrap_or(0)
    }

    pub fn bump_nonce(&mut self, address: &Address) {
        self.entry(address).nonce += 1;
    }

    /// Sum of all balances, saturating at `Amount::MAX`.
    pub fn total_supply(&self) -> Amount {
        self.accounts
            .values()
            .fold(0, |acc: Amount, a| acc.saturating_add(a.balance))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl TokenLedger for TokenBalances {
    fn balance_of(&self, account: &Address) -> Amount {
        self.accounts.get(account).map(|a| a.balance).unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TesseraError> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let have = self.balance_of(from);
        if have < amount {
            return Err(TesseraError::InsufficientBalance { need: amount, have });
        }
        self.entry(from).balance -= amount;
        let dest = self.entry(to);
        dest.balance = dest.balance.checked_add(amount).ok_or(TesseraError::Overflow)?;
        Ok(())
    }
}
