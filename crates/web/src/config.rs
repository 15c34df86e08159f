//! Environment configuration for the provisioning service
//!
//! Everything the pipeline needs is read once at startup and fails fast
//! when absent. A deployment never runs on silent fallbacks for tunnel
//! parameters or collaborator endpoints.

use ipnetwork::Ipv4Network;
use std::net::SocketAddr;
use std::time::Duration;
use wiregrant_common::{ens, Error, EthAddress, Result, ServerParams};

/// Which content-store backend to publish to
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Remote IPFS node HTTP API
    Ipfs { api_url: String },
    /// Local content-addressed directory
    Disk { root: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub rpc_url: String,
    pub registry: EthAddress,
    pub store: StoreBackend,
    pub gateway_url: String,
    pub subnet: Ipv4Network,
    pub server_params: ServerParams,
    pub upstream_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr: SocketAddr = std::env::var("WIREGRANT_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("WIREGRANT_ADDR: {}", e)))?;

        let rpc_url = require("ETH_RPC_URL")?;
        let registry: EthAddress = std::env::var("ENS_REGISTRY_ADDRESS")
            .unwrap_or_else(|_| ens::DEFAULT_REGISTRY.to_string())
            .parse()?;

        // Exactly one backend: a remote node, or a local directory.
        let store = match (env_opt("IPFS_API_URL"), env_opt("WIREGRANT_STORE_DIR")) {
            (Some(api_url), None) => StoreBackend::Ipfs { api_url },
            (None, Some(root)) => StoreBackend::Disk { root },
            (Some(_), Some(_)) => {
                return Err(Error::InvalidConfig(
                    "set either IPFS_API_URL or WIREGRANT_STORE_DIR, not both".into(),
                ))
            }
            (None, None) => {
                return Err(Error::InvalidConfig(
                    "one of IPFS_API_URL or WIREGRANT_STORE_DIR is required".into(),
                ))
            }
        };

        let gateway_url = require("IPFS_GATEWAY_URL")?;

        let subnet: Ipv4Network = require("WIREGRANT_SUBNET")?
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("WIREGRANT_SUBNET: {}", e)))?;

        let upstream_timeout = std::env::var("WIREGRANT_UPSTREAM_TIMEOUT_SECS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| Error::InvalidConfig(format!("WIREGRANT_UPSTREAM_TIMEOUT_SECS: {}", e)))?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Ok(Self {
            bind_addr,
            rpc_url,
            registry,
            store,
            gateway_url,
            subnet,
            server_params: ServerParams::from_env()?,
            upstream_timeout,
        })
    }
}

fn env_opt(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn require(var: &str) -> Result<String> {
    env_opt(var).ok_or_else(|| Error::IncompleteServerParams(var.into()))
}
