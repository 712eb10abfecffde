//! HTTP transport and host bridge
//!
//! [`HttpTransport`] is the generic request primitive used for the manifest
//! and by the reference asset drivers. [`HttpBridge`] is the optional native
//! HTTP capability an embedded runtime exposes to its web content.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::common::create_http_client;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("HTTP bridge request failed: {0}")]
    Bridge(String),
}

/// Generic GET primitive
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` and return the body as text
    async fn get_text(&self, url: &str) -> Result<String, TransportError>;

    /// GET `url` and return the raw body
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// [`HttpTransport`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            client: create_http_client()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, TransportError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        self.send(url)
            .await?
            .text()
            .await
            .map_err(|e| TransportError::Body {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let bytes = self
            .send(url)
            .await?
            .bytes()
            .await
            .map_err(|e| TransportError::Body {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(bytes.to_vec())
    }
}

/// Response delivered by a host HTTP bridge; `data` is the body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeResponse {
    pub status: u16,
    pub data: String,
}

impl BridgeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Native HTTP capability provided by an embedded runtime
#[async_trait]
pub trait HttpBridge: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &HashMap<String, String>,
        headers: &HashMap<String, String>,
    ) -> Result<BridgeResponse, TransportError>;
}
