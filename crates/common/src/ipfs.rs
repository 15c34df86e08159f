//! IPFS HTTP API backend for the publication store
//!
//! Speaks the node's RPC API directly: `/api/v0/add`, `/api/v0/cat`,
//! `/api/v0/pin/add`. Every call is bounded by the configured timeout;
//! transport failures surface as `StoreUnavailable`.

use crate::store::ContentStore;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct IpfsStore {
    http: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsStore {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

#[async_trait]
impl ContentStore for IpfsStore {
    async fn put(&self, data: &[u8]) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name("content");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint("/api/v0/add"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("malformed add response: {}", e)))?;
        debug!(address = %added.hash, "added content to ipfs");
        Ok(added.hash)
    }

    async fn get(&self, address: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(self.endpoint("/api/v0/cat"))
            .query(&[("arg", address)])
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn pin(&self, address: &str) -> Result<()> {
        self.http
            .post(self.endpoint("/api/v0/pin/add"))
            .query(&[("arg", address)])
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        debug!(address, "pinned content on ipfs");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_node_is_store_unavailable() {
        // Reserved TEST-NET address: nothing listens there.
        let store = IpfsStore::new("http://192.0.2.1:5001", Duration::from_millis(200)).unwrap();

        assert!(matches!(
            store.put(b"data").await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.get("QmUnreachable").await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.pin("QmUnreachable").await,
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_endpoint_normalizes_trailing_slash() {
        let store = IpfsStore::new("http://localhost:5001/", Duration::from_secs(1)).unwrap();
        assert_eq!(store.endpoint("/api/v0/add"), "http://localhost:5001/api/v0/add");
    }
}
