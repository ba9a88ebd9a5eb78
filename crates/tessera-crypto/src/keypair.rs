use pqcrypto_dilithium::dilithium2;
use pqcrypto_traits::sign::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use tessera_core::types::{Address, DilithiumPublicKey, DilithiumSignature, SignatureEnvelope};
use zeroize::{Zeroize, Zeroizing};

use crate::dilithium::{self, SignatureError};
use crate::hash::address_from_pubkey;

/// Account key material. Ticket issuers hold two of these: the standing
/// signer and an ephemeral body key.
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyPair {
    pub address: Address,
    pub public_key: DilithiumPublicKey,
    secret_key: Vec<u8>,
}

impl KeyPair {
    pub fn generate() -> Self {
        let (pk, sk) = dilithium2::keypair();
        let public_key = DilithiumPublicKey(pk.as_bytes().to_vec());
        Self {
            address: address_from_pubkey(&public_key.0),
            public_key,
            secret_key: sk.as_bytes().to_vec(),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Result<DilithiumSignature, SignatureError> {
        let sk = Zeroizing::new(self.secret_key.clone());
        dilithium::sign(&sk, message)
    }

    /// Signature plus the public key it verifies under.
    pub fn envelope(&self, message: &[u8]) -> Result<SignatureEnvelope, SignatureError> {
        let signature = self.sign(message)?;
        Ok(SignatureEnvelope {
            public_key: self.public_key.clone(),
            signature,
        })
    }

    pub fn secret_key_bytes(&self) -> &[u8] {
        &self.secret_key
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair").field("address", &self.address).finish_non_exhaustive()
    }
}
