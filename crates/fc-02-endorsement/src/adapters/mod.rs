//! # Adapters
//!
//! - `keyring`: `EndorsementVerifier` over known peer identities

pub mod keyring;
