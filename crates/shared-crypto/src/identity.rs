//! Local signing identities.
//!
//! An in-memory stand-in for a wallet/credential store: each user holds an
//! Ed25519 keypair and a descriptor that peers see as the creator.

use crate::signatures::Ed25519KeyPair;
use parking_lot::RwLock;
use shared_types::{IdentityDescriptor, IdentityError, IdentityProvider, Role, SigningIdentity};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A user of an organization backed by a local keypair.
pub struct LocalSigningIdentity {
    descriptor: IdentityDescriptor,
    keypair: Option<Ed25519KeyPair>,
}

impl LocalSigningIdentity {
    pub fn new(
        org: impl Into<String>,
        msp_id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        keypair: Ed25519KeyPair,
    ) -> Self {
        let descriptor = IdentityDescriptor {
            msp_id: msp_id.into(),
            org: org.into(),
            name: name.into(),
            role,
            public_key: keypair.public_key().as_bytes().to_vec(),
        };
        Self {
            descriptor,
            keypair: Some(keypair),
        }
    }

    /// Generate a fresh keypair for the user.
    pub fn generate(org: &str, msp_id: &str, name: &str, role: Role) -> Self {
        Self::new(org, msp_id, name, role, Ed25519KeyPair::generate())
    }

    /// An identity whose certificate is known but whose key is not.
    pub fn verify_only(descriptor: IdentityDescriptor) -> Self {
        Self {
            descriptor,
            keypair: None,
        }
    }
}

impl SigningIdentity for LocalSigningIdentity {
    fn descriptor(&self) -> &IdentityDescriptor {
        &self.descriptor
    }

    fn can_sign(&self) -> bool {
        self.keypair.is_some()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError> {
        self.keypair
            .as_ref()
            .map(|k| k.sign(message))
            .ok_or_else(|| IdentityError::NoSigningKey {
                name: self.descriptor.name.clone(),
                org: self.descriptor.org.clone(),
            })
    }
}

/// Users keyed by `(org, name)`.
#[derive(Default)]
pub struct LocalIdentityStore {
    users: RwLock<HashMap<(String, String), Arc<dyn SigningIdentity>>>,
}

impl LocalIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, identity: Arc<dyn SigningIdentity>) {
        let d = identity.descriptor();
        let key = (d.org.clone(), d.name.clone());
        debug!(org = %d.org, user = %d.name, role = ?d.role, "Identity loaded");
        self.users.write().insert(key, identity);
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl IdentityProvider for LocalIdentityStore {
    fn get_user(&self, org: &str, name: &str) -> Option<Arc<dyn SigningIdentity>> {
        self.users
            .read()
            .get(&(org.to_string(), name.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signatures::verify_signature;

    #[test]
    fn test_local_identity_signs_verifiably() {
        let admin = LocalSigningIdentity::generate("org1.example.com", "Org1MSP", "Admin", Role::Admin);
        let signature = admin.sign(b"payload").unwrap();
        assert!(verify_signature(&admin.descriptor().public_key, b"payload", &signature).is_ok());
    }

    #[test]
    fn test_verify_only_identity_cannot_sign() {
        let admin = LocalSigningIdentity::generate("org1.example.com", "Org1MSP", "Admin", Role::Admin);
        let public = LocalSigningIdentity::verify_only(admin.descriptor().clone());
        assert!(!public.can_sign());
        assert!(matches!(public.sign(b"x"), Err(IdentityError::NoSigningKey { .. })));
    }

    #[test]
    fn test_store_lookup() {
        let store = LocalIdentityStore::new();
        store.insert(Arc::new(LocalSigningIdentity::generate(
            "org1.example.com",
            "Org1MSP",
            "Admin",
            Role::Admin,
        )));
        assert!(store.get_user("org1.example.com", "Admin").is_some());
        assert!(store.get_user("org2.example.com", "Admin").is_none());
        assert_eq!(store.len(), 1);
    }
}
