use pqcrypto_dilithium::dilithium2;
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};
use tessera_core::types::{Address, DilithiumPublicKey, DilithiumSignature, SignatureEnvelope};
use thiserror::Error;

use crate::hash::address_from_pubkey;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature does not verify")]
    InvalidSignature,
    #[error("malformed signature: {got} bytes")]
    MalformedSignature { got: usize },
    #[error("public key must be {expected} bytes, got {got}")]
    InvalidPublicKeyLength { expected: usize, got: usize },
    #[error("unusable secret key")]
    InvalidSecretKey,
}

fn parse_public_key(key: &DilithiumPublicKey) -> Result<dilithium2::PublicKey, SignatureError> {
    dilithium2::PublicKey::from_bytes(&key.0).map_err(|_| SignatureError::InvalidPublicKeyLength {
        expected: dilithium2::public_key_bytes(),
        got: key.0.len(),
    })
}

/// Detached Dilithium2 signature over `message`.
pub fn sign(secret_key: &[u8], message: &[u8]) -> Result<DilithiumSignature, SignatureError> {
    let sk = dilithium2::SecretKey::from_bytes(secret_key).map_err(|_| SignatureError::InvalidSecretKey)?;
    let detached = dilithium2::detached_sign(message, &sk);
    Ok(DilithiumSignature(detached.as_bytes().to_vec()))
}

pub fn verify_signature(
    public_key: &DilithiumPublicKey,
    message: &[u8],
    signature: &DilithiumSignature,
) -> Result<(), SignatureError> {
    let pk = parse_public_key(public_key)?;
    let detached = dilithium2::DetachedSignature::from_bytes(&signature.0)
        .map_err(|_| SignatureError::MalformedSignature { got: signature.0.len() })?;
    dilithium2::verify_detached_signature(&detached, message, &pk)
        .map_err(|_| SignatureError::InvalidSignature)
}

/// Address of the key bundled in `envelope`, once its signature over
/// `message` checks out.
pub fn recover_signer(message: &[u8], envelope: &SignatureEnvelope) -> Result<Address, SignatureError> {
    verify_signature(&envelope.public_key, message, &envelope.signature)?;
    Ok(address_from_pubkey(&envelope.public_key.0))
}
