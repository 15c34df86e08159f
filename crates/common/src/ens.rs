//! Name resolution against the on-chain registry
//!
//! `NameOracle` is the seam to the external resolution service. The
//! production implementation speaks raw Ethereum JSON-RPC (`eth_call`
//! against the registry and resolver contracts); `StaticNameOracle` backs
//! tests and offline development.

use crate::eth::{keccak256, EthAddress};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// resolver(bytes32)
const RESOLVER_SELECTOR: [u8; 4] = [0x01, 0x78, 0xb8, 0xbf];
/// addr(bytes32)
const ADDR_SELECTOR: [u8; 4] = [0x3b, 0x3b, 0x57, 0xde];
/// owner(bytes32)
const OWNER_SELECTOR: [u8; 4] = [0x02, 0x57, 0x1b, 0xe3];

/// Canonical mainnet registry address (same on every chain ENS deploys to)
pub const DEFAULT_REGISTRY: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

/// EIP-137 namehash
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&node);
        buf[32..].copy_from_slice(&label_hash);
        node = keccak256(&buf);
    }
    node
}

/// External name-resolution oracle
///
/// `resolve` maps a name to its registered address; `owner` reads the
/// registry's declared owner field (the weaker, signature-free trust path).
#[async_trait]
pub trait NameOracle: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<EthAddress>;
    async fn owner(&self, name: &str) -> Result<EthAddress>;
}

/// JSON-RPC backed registry oracle
pub struct EnsRegistry {
    http: reqwest::Client,
    rpc_url: String,
    registry: EthAddress,
}

impl EnsRegistry {
    /// Build an oracle against an Ethereum JSON-RPC endpoint.
    ///
    /// Every upstream call is bounded by `timeout`; exceeding it surfaces
    /// `ResolutionUnavailable`, never a hang.
    pub fn new(rpc_url: impl Into<String>, registry: EthAddress, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ResolutionUnavailable(e.to_string()))?;
        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            registry,
        })
    }

    async fn eth_call(&self, to: &EthAddress, data: &[u8]) -> Result<Vec<u8>> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                {
                    "to": format!("0x{}", hex::encode(to.as_bytes())),
                    "data": format!("0x{}", hex::encode(data)),
                },
                "latest",
            ],
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ResolutionUnavailable(e.to_string()))?;
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::ResolutionUnavailable(e.to_string()))?;

        if let Some(err) = payload.get("error") {
            return Err(Error::ResolutionUnavailable(format!(
                "rpc error: {}",
                err.get("message").and_then(|m| m.as_str()).unwrap_or("unknown")
            )));
        }

        let result = payload
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| Error::ResolutionUnavailable("rpc response missing result".into()))?;
        hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| Error::ResolutionUnavailable(format!("malformed rpc result: {}", e)))
    }

    async fn call_for_address(
        &self,
        to: &EthAddress,
        selector: [u8; 4],
        node: &[u8; 32],
    ) -> Result<EthAddress> {
        let mut data = Vec::with_capacity(36);
        data.extend_from_slice(&selector);
        data.extend_from_slice(node);

        let word = self.eth_call(to, &data).await?;
        if word.len() < 32 {
            return Err(Error::ResolutionUnavailable(format!(
                "short rpc return: {} bytes",
                word.len()
            )));
        }
        EthAddress::from_slice(&word[12..32])
    }
}

#[async_trait]
impl NameOracle for EnsRegistry {
    async fn resolve(&self, name: &str) -> Result<EthAddress> {
        let node = namehash(name);

        let resolver = self
            .call_for_address(&self.registry, RESOLVER_SELECTOR, &node)
            .await?;
        if resolver.is_zero() {
            return Err(Error::NameNotFound(name.to_string()));
        }
        debug!(name, %resolver, "registry returned resolver");

        let address = self.call_for_address(&resolver, ADDR_SELECTOR, &node).await?;
        if address.is_zero() {
            return Err(Error::NameNotFound(name.to_string()));
        }
        debug!(name, %address, "resolved name");
        Ok(address)
    }

    async fn owner(&self, name: &str) -> Result<EthAddress> {
        let node = namehash(name);
        let owner = self
            .call_for_address(&self.registry, OWNER_SELECTOR, &node)
            .await?;
        if owner.is_zero() {
            return Err(Error::NameNotFound(name.to_string()));
        }
        Ok(owner)
    }
}

/// In-memory oracle for tests and offline development
#[derive(Default)]
pub struct StaticNameOracle {
    entries: HashMap<String, StaticEntry>,
}

struct StaticEntry {
    address: EthAddress,
    owner: EthAddress,
}

impl StaticNameOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name whose owner equals its resolved address.
    pub fn with_name(mut self, name: &str, address: EthAddress) -> Self {
        self.entries.insert(
            name.to_lowercase(),
            StaticEntry { address, owner: address },
        );
        self
    }

    /// Register a name with distinct resolved address and registry owner.
    pub fn with_entry(mut self, name: &str, address: EthAddress, owner: EthAddress) -> Self {
        self.entries
            .insert(name.to_lowercase(), StaticEntry { address, owner });
        self
    }
}

#[async_trait]
impl NameOracle for StaticNameOracle {
    async fn resolve(&self, name: &str) -> Result<EthAddress> {
        self.entries
            .get(&name.to_lowercase())
            .map(|e| e.address)
            .ok_or_else(|| Error::NameNotFound(name.to_string()))
    }

    async fn owner(&self, name: &str) -> Result<EthAddress> {
        self.entries
            .get(&name.to_lowercase())
            .map(|e| e.owner)
            .ok_or_else(|| Error::NameNotFound(name.to_string()))
    }
}
