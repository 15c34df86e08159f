//! Tunnel key generation
//!
//! Key derivation goes through the `KeyAgreement` seam so the curve
//! operation stays swappable; the required implementation is X25519
//! base-point multiplication via x25519-dalek. The public key must always
//! be re-derivable from the private key through the curve operation:
//! a digest-derived "public key" cannot participate in key agreement.

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};

/// One-way public-key derivation for the tunnel protocol's curve
pub trait KeyAgreement: Send + Sync {
    fn derive_public(&self, private: &[u8; 32]) -> [u8; 32];
}

/// X25519 base-point multiplication
pub struct X25519;

impl KeyAgreement for X25519 {
    fn derive_public(&self, private: &[u8; 32]) -> [u8; 32] {
        let secret = StaticSecret::from(*private);
        PublicKey::from(&secret).to_bytes()
    }
}

/// Tunnel key pair, base64-encoded in WireGuard wire format
#[derive(Clone)]
pub struct TunnelKeyPair {
    pub private_key: String,
    pub public_key: String,
}

impl std::fmt::Debug for TunnelKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelKeyPair")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl TunnelKeyPair {
    /// Generate a fresh key pair from the OS entropy source.
    ///
    /// Fails with `EntropyUnavailable` if the source cannot be read; there
    /// is no fallback to a weaker generator.
    pub fn generate(scheme: &dyn KeyAgreement) -> Result<Self> {
        let mut private = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut private)
            .map_err(|e| Error::EntropyUnavailable(e.to_string()))?;
        clamp(&mut private);

        let public = scheme.derive_public(&private);
        Ok(Self {
            private_key: STANDARD.encode(private),
            public_key: STANDARD.encode(public),
        })
    }

    /// Re-derive the public key from an encoded private key.
    pub fn rederive_public(scheme: &dyn KeyAgreement, private_b64: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(private_b64)
            .map_err(|e| Error::InvalidConfig(format!("invalid private key: {}", e)))?;
        let private: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidConfig("private key must be 32 bytes".into()))?;
        Ok(STANDARD.encode(scheme.derive_public(&private)))
    }
}

/// WireGuard key clamping (as per the protocol spec)
fn clamp(key: &mut [u8; 32]) {
    key[0] &= 248;
    key[31] &= 127;
    key[31] |= 64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp = TunnelKeyPair::generate(&X25519).unwrap();
        assert_eq!(kp.private_key.len(), 44); // Base64 of 32 bytes
        assert_eq!(kp.public_key.len(), 44);
        assert_ne!(kp.private_key, kp.public_key);
    }

    #[test]
    fn test_fresh_entropy_per_call() {
        let a = TunnelKeyPair::generate(&X25519).unwrap();
        let b = TunnelKeyPair::generate(&X25519).unwrap();
        assert_ne!(a.private_key, b.private_key);
        assert_ne!(a.public_key, b.public_key);
    }

    #[test]
    fn test_public_rederivable_from_private() {
        let kp = TunnelKeyPair::generate(&X25519).unwrap();
        let rederived = TunnelKeyPair::rederive_public(&X25519, &kp.private_key).unwrap();
        assert_eq!(rederived, kp.public_key);
    }

    #[test]
    fn test_public_key_is_not_a_digest() {
        use sha2::{Digest, Sha256};

        let kp = TunnelKeyPair::generate(&X25519).unwrap();
        let private = STANDARD.decode(&kp.private_key).unwrap();
        let digest = Sha256::digest(&private);
        assert_ne!(STANDARD.encode(digest), kp.public_key);
    }

    #[test]
    fn test_private_key_is_clamped() {
        let kp = TunnelKeyPair::generate(&X25519).unwrap();
        let private = STANDARD.decode(&kp.private_key).unwrap();
        assert_eq!(private[0] & 7, 0);
        assert_eq!(private[31] & 128, 0);
        assert_eq!(private[31] & 64, 64);
    }

    #[test]
    fn test_rederive_rejects_bad_input() {
        assert!(TunnelKeyPair::rederive_public(&X25519, "not base64!").is_err());
        assert!(TunnelKeyPair::rederive_public(&X25519, &STANDARD.encode([0u8; 16])).is_err());
    }
}
