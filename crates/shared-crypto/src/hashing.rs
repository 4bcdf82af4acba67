//! # SHA-256 Hashing
//!
//! Digests used for transaction IDs, proposal hashes and result digests.

use sha2::{Digest, Sha256};
use shared_types::Hash;

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash the concatenation of multiple inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// What an endorsing peer signs: the proposal hash, then the digest of its
/// simulation result.
pub fn endorsement_digest(payload_hash: &Hash, result_digest: &Hash) -> Hash {
    sha256_many(&[payload_hash, result_digest])
}
