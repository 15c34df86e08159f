//! HTTP client for the Wiregrant service

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Client for the provisioning service API
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Resolved {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipCheck {
    pub name: String,
    pub address: String,
    pub is_owner: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureCheck {
    pub name: String,
    pub is_valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub name: String,
    pub client_id: String,
    pub address: String,
    pub assigned_ip: String,
    pub public_key: String,
    pub content_address: String,
    pub filename: String,
    pub pinned: bool,
    pub gateway_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelStatus {
    pub client_id: String,
    pub status: String,
    pub last_seen: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Published {
    pub content_address: String,
    pub gateway_url: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Check if the service is reachable
    pub async fn health_check(&self) -> bool {
        self.http
            .get(format!("{}/health", self.base))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    pub async fn resolve(&self, name: &str) -> Result<Resolved> {
        let response = self
            .http
            .get(format!("{}/identity/resolve/{}", self.base, name))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn verify_ownership(&self, name: &str, address: &str) -> Result<OwnershipCheck> {
        let response = self
            .http
            .post(format!("{}/identity/verify-ownership", self.base))
            .json(&json!({ "name": name, "address": address }))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn verify_signature(
        &self,
        name: &str,
        message: &str,
        signature: &str,
    ) -> Result<SignatureCheck> {
        let response = self
            .http
            .post(format!("{}/identity/verify-signature", self.base))
            .json(&json!({ "name": name, "message": message, "signature": signature }))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn provision(
        &self,
        name: &str,
        message: &str,
        signature: &str,
    ) -> Result<Credential> {
        let response = self
            .http
            .post(format!("{}/tunnel/provision", self.base))
            .json(&json!({ "name": name, "message": message, "signature": signature }))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn tunnel_status(&self, client_id: &str) -> Result<TunnelStatus> {
        let response = self
            .http
            .get(format!("{}/tunnel/status/{}", self.base, client_id))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn storage_put(&self, content: &str) -> Result<Published> {
        let response = self
            .http
            .post(format!("{}/storage/put", self.base))
            .json(&json!({ "content": content }))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn storage_get(&self, address: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/storage/get/{}", self.base, address))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn storage_gateway(&self, address: &str) -> Result<Published> {
        let response = self
            .http
            .get(format!("{}/storage/gateway/{}", self.base, address))
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn api_error(response: reqwest::Response) -> anyhow::Error {
        let status = response.status();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| "unknown error".to_string());
        anyhow!("{}: {}", status, message)
    }
}
