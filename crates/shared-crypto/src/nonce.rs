//! Nonces and transaction IDs.
//!
//! A transaction ID is `hex(SHA-256(nonce || creator))`. The nonce comes from
//! the operating system CSPRNG, so IDs never repeat across concurrent
//! builders and never depend on wall-clock time.

use crate::hashing::sha256_many;
use rand::rngs::OsRng;
use rand::RngCore;
use shared_types::TxId;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Draw a fresh nonce from the OS CSPRNG.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Derive the transaction ID bound to a nonce and creator.
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> TxId {
    TxId::from_digest(&sha256_many(&[nonce, creator]))
}
