//! HTTP API routes
//!
//! One resource per concern:
//! - `/identity`: name resolution and ownership/signature verification
//! - `/tunnel`: credential provisioning and client status
//! - `/storage`: content-addressed publication access

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use wiregrant_common::{
    client_id::is_client_id, eth::decode_signature_hex, gateway_url, validate_name, Error,
    EthAddress, Provisioned,
};

use crate::server::AppState;

// ============================================================================
// Error mapping
// ============================================================================

/// HTTP rendering of pipeline errors.
///
/// Client faults map to 4xx with the message intact; infrastructure
/// failures map to 5xx with a generic body; the detail goes to the server
/// log only.
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<Error>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            detail: None,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let (status, message) = match &e {
            Error::InvalidName(_) | Error::NameNotFound(_) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Error::InvalidSignature(_) => (StatusCode::UNAUTHORIZED, "Invalid signature".into()),
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
            Error::AddressPoolExhausted => (
                StatusCode::SERVICE_UNAVAILABLE,
                "No tunnel addresses available".into(),
            ),
            Error::ResolutionUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Name resolution unavailable".into(),
            ),
            Error::StoreUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Content store unavailable".into(),
            ),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into()),
        };
        Self {
            status,
            message,
            detail: Some(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.detail {
                Some(e) => error!(status = %self.status, error = %e, "request failed"),
                None => error!(status = %self.status, message = %self.message, "request failed"),
            }
        }
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ResolveResponse {
    name: String,
    address: EthAddress,
}

#[derive(Debug, Deserialize)]
struct VerifyOwnershipRequest {
    name: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOwnershipResponse {
    name: String,
    address: EthAddress,
    is_owner: bool,
}

#[derive(Debug, Deserialize)]
struct VerifySignatureRequest {
    name: Option<String>,
    message: Option<String>,
    signature: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifySignatureResponse {
    name: String,
    is_valid: bool,
}

#[derive(Debug, Deserialize)]
struct ProvisionRequest {
    name: Option<String>,
    message: Option<String>,
    signature: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProvisionResponse {
    #[serde(flatten)]
    issued: Provisioned,
    gateway_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    client_id: String,
    status: String,
    last_seen: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StoragePutRequest {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoragePutResponse {
    content_address: String,
    gateway_url: String,
}

// ============================================================================
// Router
// ============================================================================

pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Identity
        .route("/identity/resolve/:name", get(resolve_name_handler))
        .route("/identity/verify-ownership", post(verify_ownership_handler))
        .route("/identity/verify-signature", post(verify_signature_handler))
        // Tunnel
        .route("/tunnel/provision", post(provision_handler))
        .route("/tunnel/status/:client_id", get(tunnel_status_handler))
        // Storage
        .route("/storage/put", post(storage_put_handler))
        .route("/storage/get/:address", get(storage_get_handler))
        .route("/storage/gateway/:address", get(storage_gateway_handler))
        // Health
        .route("/health", get(health_handler))
        .with_state(state)
}

// ============================================================================
// Identity handlers
// ============================================================================

async fn resolve_name_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let name = validate_name(&name).map_err(Error::from)?;
    let address = state.oracle.resolve(&name).await?;
    Ok(Json(ResolveResponse { name, address }))
}

async fn verify_ownership_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyOwnershipRequest>,
) -> Result<Json<VerifyOwnershipResponse>, ApiError> {
    let (Some(name), Some(address)) = (req.name, req.address) else {
        return Err(ApiError::bad_request("Name and address are required"));
    };
    let address: EthAddress = address
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid address"))?;

    let is_owner = state.verifier.verify_ownership(&name, &address).await?;
    Ok(Json(VerifyOwnershipResponse {
        name: name.trim().to_lowercase(),
        address,
        is_owner,
    }))
}

async fn verify_signature_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifySignatureRequest>,
) -> Result<Json<VerifySignatureResponse>, ApiError> {
    let (Some(name), Some(message), Some(signature)) = (req.name, req.message, req.signature)
    else {
        return Err(ApiError::bad_request(
            "Name, message, and signature are required",
        ));
    };

    let signature = decode_signature_hex(&signature)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    // On this endpoint a malformed signature is a field error, not an
    // authentication failure.
    match state
        .verifier
        .verify_signature(&name, message.as_bytes(), &signature)
        .await
    {
        Ok(is_valid) => Ok(Json(VerifySignatureResponse {
            name: name.trim().to_lowercase(),
            is_valid,
        })),
        Err(Error::InvalidSignature(e)) => Err(ApiError::bad_request(e)),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Tunnel handlers
// ============================================================================

async fn provision_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProvisionRequest>,
) -> Result<Json<ProvisionResponse>, ApiError> {
    let (Some(name), Some(message), Some(signature)) = (req.name, req.message, req.signature)
    else {
        return Err(ApiError::bad_request(
            "Name, message, and signature are required",
        ));
    };

    let signature = decode_signature_hex(&signature)?;
    let issued = state
        .provisioner
        .provision(&name, message.as_bytes(), &signature)
        .await?;

    let gateway_url = gateway_url(&state.gateway_base, &issued.content_address);
    Ok(Json(ProvisionResponse { issued, gateway_url }))
}

async fn tunnel_status_handler(
    Path(client_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    if !is_client_id(&client_id) {
        return Err(ApiError::bad_request("Invalid client id"));
    }

    // Connection tracking needs the tunnel data plane, which lives outside
    // this service; clients are reported as disconnected until then.
    Ok(Json(StatusResponse {
        client_id,
        status: "disconnected".to_string(),
        last_seen: None,
    }))
}

// ============================================================================
// Storage handlers
// ============================================================================

async fn storage_put_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StoragePutRequest>,
) -> Result<Json<StoragePutResponse>, ApiError> {
    let Some(content) = req.content else {
        return Err(ApiError::bad_request("Content is required"));
    };

    let content_address = state.store.put(content.as_bytes()).await?;
    let gateway_url = gateway_url(&state.gateway_base, &content_address);
    Ok(Json(StoragePutResponse {
        content_address,
        gateway_url,
    }))
}

async fn storage_get_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    let content = state.store.get(&address).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        content,
    )
        .into_response())
}

async fn storage_gateway_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Json<StoragePutResponse> {
    let gateway_url = gateway_url(&state.gateway_base, &address);
    Json(StoragePutResponse {
        content_address: address,
        gateway_url,
    })
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(e: Error) -> StatusCode {
        ApiError::from(e).status
    }

    #[test]
    fn test_client_faults_map_to_4xx() {
        assert_eq!(
            status_for(Error::NameNotFound("ghost.eth".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(Error::InvalidName("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(Error::InvalidSignature("mismatch".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(Error::NotFound { kind: "object".into(), id: "abc".into() }),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_infrastructure_faults_map_to_5xx_without_detail() {
        for e in [
            Error::ResolutionUnavailable("connect timeout to 10.0.0.1".into()),
            Error::StoreUnavailable("connect refused".into()),
            Error::EntropyUnavailable("getrandom failed".into()),
        ] {
            let api = ApiError::from(e);
            assert!(api.status.is_server_error());
            // Upstream detail never reaches the response body
            assert!(!api.message.contains("10.0.0.1"));
            assert!(!api.message.contains("getrandom"));
        }
    }

    #[test]
    fn test_pool_exhaustion_is_retryable() {
        assert_eq!(
            status_for(Error::AddressPoolExhausted),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
