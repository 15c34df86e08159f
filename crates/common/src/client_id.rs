//! Client identity derivation
//!
//! A client id is the first 12 hex characters of SHA-256 over the
//! normalized name: deterministic per name, one-way, and already safe as a
//! filename component. 12 hex chars carry 48 bits, so a 50% birthday
//! collision needs on the order of 2^24 (~16.7M) distinct names.

use sha2::{Digest, Sha256};

/// Length of a derived client id in hex characters
pub const CLIENT_ID_LEN: usize = 12;

/// Derive the stable client id for a name.
pub fn derive_client_id(name: &str) -> String {
    let digest = Sha256::digest(name.trim().to_lowercase().as_bytes());
    hex::encode(digest)[..CLIENT_ID_LEN].to_string()
}

/// Configuration filename for a client id, stripped to alphanumerics.
pub fn config_filename(client_id: &str) -> String {
    let safe: String = client_id.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("{}.conf", safe)
}

/// True if `id` has the shape of a derived client id.
pub fn is_client_id(id: &str) -> bool {
    id.len() == CLIENT_ID_LEN && id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase())
}
