//! # Shared Crypto
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Transaction IDs, proposal hashes, result digests |
//! | `nonce` | OS CSPRNG | Proposal nonces |
//! | `signatures` | Ed25519 | Proposal, endorsement and envelope signatures |
//! | `identity` | Ed25519 | Local signing identities and identity store |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Nonces**: drawn from `OsRng`, never derived from time

#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod identity;
pub mod nonce;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{endorsement_digest, sha256, sha256_many};
pub use identity::{LocalIdentityStore, LocalSigningIdentity};
pub use nonce::{compute_tx_id, generate_nonce, NONCE_LEN};
pub use signatures::{verify_signature, Ed25519KeyPair, Ed25519PublicKey};
