//! Wiregrant Core Library
//!
//! The authenticated credential-provisioning pipeline: name resolution and
//! signature verification, client identity derivation, tunnel key
//! generation, configuration rendering, and content-addressed publication
//! with pinning. The HTTP surface lives in `wiregrant-web`.

pub mod client_id;
pub mod ens;
pub mod error;
pub mod eth;
pub mod identity;
pub mod ipfs;
pub mod keys;
pub mod name;
pub mod pool;
pub mod provision;
pub mod store;
pub mod template;

// Re-export commonly used types
pub use client_id::{config_filename, derive_client_id, CLIENT_ID_LEN};
pub use ens::{namehash, EnsRegistry, NameOracle, StaticNameOracle};
pub use error::{Error, Result};
pub use eth::{recover_signer, EthAddress};
pub use identity::IdentityVerifier;
pub use ipfs::IpfsStore;
pub use keys::{KeyAgreement, TunnelKeyPair, X25519};
pub use name::validate_name;
pub use pool::AddressPool;
pub use provision::{Provisioned, Provisioner, Stage};
pub use store::{gateway_url, ContentStore, DiskStore};
pub use template::{render_client_config, ServerParams};

/// Wiregrant version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
