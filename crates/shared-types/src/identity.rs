//! Identity port.
//!
//! Credential storage, enrollment and key material are external concerns.
//! The core only reads the descriptor and asks for `sign(bytes)`.

use crate::entities::Role;
use crate::envelope::to_canonical_bytes;
use crate::errors::{CodecError, IdentityError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Public description of a requestor, embedded as `creator` in every header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDescriptor {
    pub msp_id: String,
    pub org: String,
    pub name: String,
    pub role: Role,
    pub public_key: Vec<u8>,
}

impl IdentityDescriptor {
    /// Canonical bytes used as the creator field and in transaction IDs.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        to_canonical_bytes(self)
    }
}

/// A requestor able to sign proposals and transactions.
///
/// Implementations must be immutable once loaded; one identity is shared
/// read-only by every concurrent call it originates.
pub trait SigningIdentity: Send + Sync {
    fn descriptor(&self) -> &IdentityDescriptor;

    /// Whether a private key is attached.
    fn can_sign(&self) -> bool;

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError>;
}

/// Source of signing identities by organization and user name.
pub trait IdentityProvider: Send + Sync {
    fn get_user(&self, org: &str, name: &str) -> Option<Arc<dyn SigningIdentity>>;
}
