//! # Ed25519 Signatures
//!
//! Deterministic signatures over canonical message bytes. Peers and the
//! client use the same primitives, so verification works on raw byte slices
//! as they arrive inside envelopes.

use crate::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use zeroize::Zeroize;

/// Public key length in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;
/// Signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Ed25519 public key (32 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ed25519PublicKey([u8; PUBLIC_KEY_LEN]);

impl Ed25519PublicKey {
    /// Create from bytes, rejecting points off the curve.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; PUBLIC_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Verify a signature given as raw bytes.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig: [u8; SIGNATURE_LEN] =
            signature
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureFormat {
                    expected: SIGNATURE_LEN,
                    actual: signature.len(),
                })?;

        verifying_key
            .verify(message, &ed25519_dalek::Signature::from_bytes(&sig))
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// Ed25519 keypair. Secret material is wiped on drop.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        Self { signing_key }
    }

    /// Create from secret seed (32 bytes).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Create from a hex-encoded seed, as stored in network profiles.
    pub fn from_hex_seed(seed: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(seed).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        let seed: Result<[u8; 32], _> = bytes.as_slice().try_into();
        bytes.zeroize();
        seed.map(Self::from_seed).map_err(|_| {
            CryptoError::InvalidPrivateKey("seed must be 32 bytes".to_string())
        })
    }

    /// Get public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message (deterministic, no RNG needed).
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

/// Verify `signature` over `message` against a raw public key.
pub fn verify_signature(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    Ed25519PublicKey::from_slice(public_key)?.verify(message, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let keypair = Ed25519KeyPair::generate();
        let signature = keypair.sign(b"proposal bytes");
        assert!(verify_signature(keypair.public_key().as_bytes(), b"proposal bytes", &signature).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let keypair = Ed25519KeyPair::generate();
        let signature = keypair.sign(b"message1");
        assert_eq!(
            keypair.public_key().verify(b"message2", &signature),
            Err(CryptoError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let keypair = Ed25519KeyPair::generate();
        let signature = keypair.sign(b"m");
        assert!(matches!(
            keypair.public_key().verify(b"m", &signature[..10]),
            Err(CryptoError::InvalidSignatureFormat { actual: 10, .. })
        ));
    }

    #[test]
    fn test_hex_seed() {
        let seed = "ab".repeat(32);
        let a = Ed25519KeyPair::from_hex_seed(&seed).unwrap();
        let b = Ed25519KeyPair::from_seed([0xAB; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert!(Ed25519KeyPair::from_hex_seed("abcd").is_err());
    }
}
