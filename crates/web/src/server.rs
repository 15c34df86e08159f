//! Service state and server loop

use crate::config::{AppConfig, StoreBackend};
use crate::routes::api_router;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use wiregrant_common::{
    AddressPool, ContentStore, DiskStore, EnsRegistry, IdentityVerifier, IpfsStore, NameOracle,
    Provisioner, Result, ServerParams, X25519,
};

/// Shared service state: explicitly constructed collaborator handles,
/// injected once at startup so tests can substitute doubles.
pub struct AppState {
    pub oracle: Arc<dyn NameOracle>,
    pub store: Arc<dyn ContentStore>,
    pub pool: Arc<AddressPool>,
    pub verifier: IdentityVerifier,
    pub provisioner: Provisioner,
    pub gateway_base: String,
}

impl AppState {
    /// Assemble state from already-built collaborators.
    pub fn new(
        oracle: Arc<dyn NameOracle>,
        store: Arc<dyn ContentStore>,
        pool: Arc<AddressPool>,
        params: ServerParams,
        gateway_base: String,
    ) -> Self {
        let provisioner = Provisioner::new(
            oracle.clone(),
            store.clone(),
            pool.clone(),
            Arc::new(X25519),
            params,
        );
        Self {
            verifier: IdentityVerifier::new(oracle.clone()),
            oracle,
            store,
            pool,
            provisioner,
            gateway_base,
        }
    }

    /// Build production collaborators from configuration.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let oracle: Arc<dyn NameOracle> = Arc::new(EnsRegistry::new(
            config.rpc_url.clone(),
            config.registry,
            config.upstream_timeout,
        )?);

        let store: Arc<dyn ContentStore> = match &config.store {
            StoreBackend::Ipfs { api_url } => {
                info!(%api_url, "publishing to ipfs node");
                Arc::new(IpfsStore::new(api_url.clone(), config.upstream_timeout)?)
            }
            StoreBackend::Disk { root } => {
                info!(%root, "publishing to local disk store");
                Arc::new(DiskStore::open(root).await?)
            }
        };

        let pool = Arc::new(AddressPool::new(config.subnet)?);
        info!(
            subnet = %config.subnet,
            assignable = pool.available(),
            server = %pool.server_address(),
            "tunnel address pool ready"
        );

        Ok(Self::new(
            oracle,
            store,
            pool,
            config.server_params.clone(),
            config.gateway_url.clone(),
        ))
    }
}

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Serve until the listener fails.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Wiregrant provisioning service on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
