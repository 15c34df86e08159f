//! Tunnel configuration rendering
//!
//! `render_client_config` is a pure function: identical inputs produce
//! byte-identical documents, so published content addresses are
//! reproducible.

use crate::keys::TunnelKeyPair;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Server-side connection parameters, all required
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerParams {
    pub public_key: String,
    /// host:port the client connects to
    pub endpoint: String,
    pub dns: String,
    pub keepalive_secs: u16,
}

impl ServerParams {
    /// Read parameters from the environment, failing fast on any missing
    /// value. There are no built-in fallbacks: a deployment must state its
    /// tunnel parameters explicitly.
    pub fn from_env() -> Result<Self> {
        let params = Self {
            public_key: require_env("WG_SERVER_PUBLIC_KEY")?,
            endpoint: require_env("WG_SERVER_ENDPOINT")?,
            dns: require_env("WG_DNS")?,
            keepalive_secs: require_env("WG_KEEPALIVE")?
                .parse()
                .map_err(|_| Error::IncompleteServerParams("WG_KEEPALIVE must be an integer".into()))?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.public_key.trim().is_empty() {
            return Err(Error::IncompleteServerParams("server public key".into()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(Error::IncompleteServerParams("server endpoint".into()));
        }
        if !self.endpoint.contains(':') {
            return Err(Error::IncompleteServerParams(
                "server endpoint must be host:port".into(),
            ));
        }
        if self.dns.trim().is_empty() {
            return Err(Error::IncompleteServerParams("dns server".into()));
        }
        if self.keepalive_secs == 0 {
            return Err(Error::IncompleteServerParams("keepalive seconds".into()));
        }
        Ok(())
    }
}

fn require_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::IncompleteServerParams(var.into())),
    }
}

/// Render the client tunnel configuration document.
pub fn render_client_config(
    keys: &TunnelKeyPair,
    assigned_ip: Ipv4Addr,
    params: &ServerParams,
) -> Result<String> {
    params.validate()?;

    Ok(format!(
        r#"[Interface]
PrivateKey = {private_key}
Address = {assigned_ip}/32
DNS = {dns}

[Peer]
PublicKey = {server_public_key}
AllowedIPs = 0.0.0.0/0, ::/0
Endpoint = {endpoint}
PersistentKeepalive = {keepalive}
"#,
        private_key = keys.private_key,
        assigned_ip = assigned_ip,
        dns = params.dns,
        server_public_key = params.public_key,
        endpoint = params.endpoint,
        keepalive = params.keepalive_secs,
    ))
}
