//! Identity verification
//!
//! Two trust paths, chosen per use case:
//! - `verify_signature` / `authenticate`: live proof that the caller signed a
//!   message with the key controlling the name's registered address.
//!   Provisioning requires this path.
//! - `verify_ownership`: registry-owner equality only. Weaker, because it
//!   trusts registry state rather than a fresh signing proof; used for
//!   read-only ownership checks.

use crate::ens::NameOracle;
use crate::eth::{recover_signer, EthAddress};
use crate::name::validate_name;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub struct IdentityVerifier {
    oracle: Arc<dyn NameOracle>,
}

impl IdentityVerifier {
    pub fn new(oracle: Arc<dyn NameOracle>) -> Self {
        Self { oracle }
    }

    /// Check that `signature` over `message` was produced by the key
    /// controlling `name`'s registered address.
    ///
    /// Returns Ok(false) for a well-formed signature by the wrong key;
    /// fails with `InvalidSignature` only for malformed input, and with
    /// `NameNotFound` / `ResolutionUnavailable` from the oracle.
    pub async fn verify_signature(
        &self,
        name: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool> {
        let name = validate_name(name)?;
        let registered = self.oracle.resolve(&name).await?;
        let signer = recover_signer(message, signature)?;

        let is_valid = signer == registered;
        info!(name = %name, %signer, %registered, is_valid, "signature verification");
        Ok(is_valid)
    }

    /// Signature check that yields the registered address on success and
    /// `InvalidSignature` on mismatch. This is the provisioning entry path.
    pub async fn authenticate(
        &self,
        name: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<EthAddress> {
        let name = validate_name(name)?;
        let registered = self.oracle.resolve(&name).await?;
        let signer = recover_signer(message, signature)?;

        if signer != registered {
            debug!(name = %name, %signer, %registered, "signer does not control the registered address");
            return Err(Error::InvalidSignature(
                "signer does not control the registered address".into(),
            ));
        }
        Ok(registered)
    }

    /// Check the registry's declared owner field against `address`.
    pub async fn verify_ownership(&self, name: &str, address: &EthAddress) -> Result<bool> {
        let name = validate_name(name)?;
        let owner = self.oracle.owner(&name).await?;

        let is_owner = owner == *address;
        info!(name = %name, %owner, claimed = %address, is_owner, "ownership verification");
        Ok(is_owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ens::StaticNameOracle;
    use crate::eth::{address_from_pubkey, personal_message_digest};
    use k256::ecdsa::SigningKey;
    use rand::rngs::OsRng;

    fn sign_personal(key: &SigningKey, message: &[u8]) -> Vec<u8> {
        let digest = personal_message_digest(message);
        let (sig, recid) = key.sign_prehash_recoverable(&digest).unwrap();
        let mut out = sig.to_bytes().to_vec();
        out.push(27 + recid.to_byte());
        out
    }

    fn verifier_for(name: &str, key: &SigningKey) -> IdentityVerifier {
        let address = address_from_pubkey(key.verifying_key());
        let oracle = StaticNameOracle::new().with_name(name, address);
        IdentityVerifier::new(Arc::new(oracle))
    }

    #[tokio::test]
    async fn test_valid_signature() {
        let key = SigningKey::random(&mut OsRng);
        let verifier = verifier_for("alice.eth", &key);

        let message = b"auth:alice.eth";
        let signature = sign_personal(&key, message);
        assert!(verifier.verify_signature("alice.eth", message, &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_key_is_not_valid() {
        let alice = SigningKey::random(&mut OsRng);
        let mallory = SigningKey::random(&mut OsRng);
        let verifier = verifier_for("alice.eth", &alice);

        let message = b"auth:alice.eth";
        let signature = sign_personal(&mallory, message);
        assert!(!verifier.verify_signature("alice.eth", message, &signature).await.unwrap());

        assert!(matches!(
            verifier.authenticate("alice.eth", message, &signature).await,
            Err(Error::InvalidSignature(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_name() {
        let key = SigningKey::random(&mut OsRng);
        let verifier = verifier_for("alice.eth", &key);

        let signature = sign_personal(&key, b"auth:bob.eth");
        assert!(matches!(
            verifier.verify_signature("bob.eth", b"auth:bob.eth", &signature).await,
            Err(Error::NameNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_name_rejected_before_oracle() {
        let key = SigningKey::random(&mut OsRng);
        let verifier = verifier_for("alice.eth", &key);

        let signature = sign_personal(&key, b"msg");
        assert!(matches!(
            verifier.verify_signature("not a name", b"msg", &signature).await,
            Err(Error::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_ownership_paths_are_distinct() {
        let resolved: EthAddress = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap();
        let owner: EthAddress = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".parse().unwrap();
        let oracle = StaticNameOracle::new().with_entry("alice.eth", resolved, owner);
        let verifier = IdentityVerifier::new(Arc::new(oracle));

        assert!(verifier.verify_ownership("alice.eth", &owner).await.unwrap());
        assert!(!verifier.verify_ownership("alice.eth", &resolved).await.unwrap());
    }
}
