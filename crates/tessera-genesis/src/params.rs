use serde::{Deserialize, Serialize};

use tessera_core::error::TesseraError;
use tessera_core::transaction::Role;
use tessera_core::types::{Address, Amount, Rate};
use tessera_state::ProtocolConfig;

/// Initial free balance for one account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Allocation {
    /// Base-58 address.
    pub account: String,
    pub amount: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub address: String,
    /// Proxy allowed to submit hashes for the validator. Defaults to the
    /// validator itself.
    #[serde(default)]
    pub submitter: Option<String>,
    #[serde(default)]
    pub commission_rate: Rate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,
    pub account: String,
}

/// Everything the chain starts with, loaded from a JSON file.
///
/// Addresses are base-58 strings as printed by `keygen`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    #[serde(default)]
    pub config: ProtocolConfig,
    pub owner: String,
    /// Standing signer for delta tickets.
    pub ticket_signer: String,
    #[serde(default)]
    pub balances: Vec<Allocation>,
    #[serde(default)]
    pub validators: Vec<GenesisValidator>,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

impl GenesisParams {
    pub fn from_json(json: &str) -> Result<Self, TesseraError> {
        serde_json::from_str(json).map_err(|e| TesseraError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, TesseraError> {
        serde_json::to_string_pretty(self).map_err(|e| TesseraError::Serialization(e.to_string()))
    }
}

pub(crate) fn parse_address(field: &str, s: &str) -> Result<Address, TesseraError> {
    let address = Address::from_b58(s)
        .map_err(|e| TesseraError::Other(format!("genesis {field}: invalid address {s:?}: {e}")))?;
    if address.is_zero() {
        return Err(TesseraError::Other(format!("genesis {field}: zero address")));
    }
    Ok(address)
}
