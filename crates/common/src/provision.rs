//! Provisioning orchestration
//!
//! One request/response cycle: verify the signed claim, derive the client
//! id, mint fresh key material, allocate a tunnel address, render the
//! configuration document, publish it, pin it. Stages run strictly in that
//! order (key material is never generated for an unverified claim) and a
//! failure at any stage aborts the rest with no partial credential
//! treated as issued. Retries are the caller's decision, never the
//! pipeline's.

use crate::client_id::{config_filename, derive_client_id};
use crate::ens::NameOracle;
use crate::eth::EthAddress;
use crate::identity::IdentityVerifier;
use crate::keys::{KeyAgreement, TunnelKeyPair};
use crate::pool::AddressPool;
use crate::store::ContentStore;
use crate::template::{render_client_config, ServerParams};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    Verifying,
    Deriving,
    KeyGenerating,
    Rendering,
    Publishing,
    Pinning,
    Completed,
}

impl Stage {
    pub const SEQUENCE: [Stage; 8] = [
        Stage::Received,
        Stage::Verifying,
        Stage::Deriving,
        Stage::KeyGenerating,
        Stage::Rendering,
        Stage::Publishing,
        Stage::Pinning,
        Stage::Completed,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Verifying => "verifying",
            Stage::Deriving => "deriving",
            Stage::KeyGenerating => "key-generating",
            Stage::Rendering => "rendering",
            Stage::Publishing => "publishing",
            Stage::Pinning => "pinning",
            Stage::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Issued credential set, returned to the caller on completion.
/// Private key material leaves the pipeline only inside the published
/// document, never in this record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provisioned {
    pub name: String,
    pub client_id: String,
    /// Address the name resolved to at verification time
    pub address: EthAddress,
    pub assigned_ip: Ipv4Addr,
    pub public_key: String,
    pub content_address: String,
    pub filename: String,
    /// False when the document published but the pin failed; the caller
    /// should retry pinning out of band.
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

pub struct Provisioner {
    verifier: IdentityVerifier,
    store: Arc<dyn ContentStore>,
    pool: Arc<AddressPool>,
    scheme: Arc<dyn KeyAgreement>,
    params: ServerParams,
}

impl Provisioner {
    pub fn new(
        oracle: Arc<dyn NameOracle>,
        store: Arc<dyn ContentStore>,
        pool: Arc<AddressPool>,
        scheme: Arc<dyn KeyAgreement>,
        params: ServerParams,
    ) -> Self {
        Self {
            verifier: IdentityVerifier::new(oracle),
            store,
            pool,
            scheme,
            params,
        }
    }

    /// Run one provisioning cycle for a signed name claim.
    pub async fn provision(
        &self,
        name: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<Provisioned> {
        let mut stage = Stage::Received;
        debug!(%stage, name, "provisioning request");

        stage = Stage::Verifying;
        let address = self
            .verifier
            .authenticate(name, message, signature)
            .await
            .map_err(|e| fail(stage, name, e))?;
        let name = name.trim().to_lowercase();

        stage = Stage::Deriving;
        let client_id = derive_client_id(&name);
        debug!(%stage, %client_id, "derived client id");

        stage = Stage::KeyGenerating;
        let keys = TunnelKeyPair::generate(self.scheme.as_ref())
            .map_err(|e| fail(stage, &name, e))?;
        let assigned_ip = self.pool.acquire().map_err(|e| fail(stage, &name, e))?;

        stage = Stage::Rendering;
        let document = match render_client_config(&keys, assigned_ip, &self.params) {
            Ok(doc) => doc,
            Err(e) => {
                self.pool.release(assigned_ip);
                return Err(fail(stage, &name, e));
            }
        };

        stage = Stage::Publishing;
        let content_address = match self.store.put(document.as_bytes()).await {
            Ok(address) => address,
            Err(e) => {
                self.pool.release(assigned_ip);
                return Err(fail(stage, &name, e));
            }
        };

        stage = Stage::Pinning;
        let pinned = match self.store.pin(&content_address).await {
            Ok(()) => true,
            Err(e) => {
                // Non-fatal: the document exists but may be garbage-collected
                // until a pin retry succeeds.
                warn!(
                    %stage,
                    name = %name,
                    %content_address,
                    error = %Error::RetentionRisk(e.to_string()),
                    "publish succeeded but pin failed"
                );
                false
            }
        };

        stage = Stage::Completed;
        let provisioned = Provisioned {
            client_id: client_id.clone(),
            filename: config_filename(&client_id),
            name: name.clone(),
            address,
            assigned_ip,
            public_key: keys.public_key.clone(),
            content_address,
            pinned,
            created_at: Utc::now(),
        };
        info!(
            %stage,
            name = %name,
            %client_id,
            %assigned_ip,
            content_address = %provisioned.content_address,
            pinned,
            "provisioning complete"
        );
        Ok(provisioned)
    }
}

fn fail(stage: Stage, name: &str, error: Error) -> Error {
    if error.is_infrastructure() {
        warn!(%stage, name, error = %error, "provisioning failed");
    } else {
        debug!(%stage, name, error = %error, "provisioning rejected");
    }
    error
}
