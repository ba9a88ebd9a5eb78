pub mod dilithium;
pub mod hash;
pub mod keypair;
pub mod ticket;
pub mod tx;

pub use dilithium::{recover_signer, verify_signature, SignatureError};
pub use hash::{address_from_pubkey, blake3_hash, tx_id_from_body};
pub use keypair::KeyPair;
pub use ticket::{verify_body, verify_head, verify_ticket, TicketIssuer};
pub use tx::{sign_transaction, verify_transaction};
