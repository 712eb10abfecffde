//! Manifest Fetcher
//!
//! Retrieves and parses the manifest through the host HTTP bridge when one
//! exists, otherwise through the generic transport.

use std::collections::HashMap;

use launchpad_manifest::{validate_manifest, Manifest, ManifestError};
use serde_json::Value;
use tracing::{debug, info};

use crate::common::LoadResult;
use crate::transport::{HttpBridge, HttpTransport, TransportError};

/// Fetch and parse the manifest at `url`.
///
/// `Ok(None)` means the body parsed to JSON `null`.
pub async fn fetch_manifest(
    url: &str,
    bridge: Option<&dyn HttpBridge>,
    transport: &dyn HttpTransport,
) -> LoadResult<Option<Value>> {
    let body = match bridge {
        Some(bridge) => {
            debug!("Fetching manifest through host bridge: {}", url);
            let empty = HashMap::new();
            let response = bridge.get(url, &empty, &empty).await?;
            if !response.is_success() {
                return Err(TransportError::Status {
                    url: url.to_string(),
                    status: response.status,
                }
                .into());
            }
            response.data
        }
        None => {
            debug!("Fetching manifest over HTTP: {}", url);
            transport.get_text(url).await?
        }
    };

    parse_manifest_body(&body)
}

/// Fetch, parse and validate in one step
pub async fn load_manifest(
    url: &str,
    supported_version: &str,
    bridge: Option<&dyn HttpBridge>,
    transport: &dyn HttpTransport,
) -> LoadResult<Manifest> {
    let payload = fetch_manifest(url, bridge, transport).await?;
    let manifest = validate_manifest(payload.as_ref(), supported_version)?;
    info!(
        "Manifest {} accepted: {} files, {} dom nodes",
        manifest.manifest_version,
        manifest.file_count(),
        manifest.dom_nodes.len()
    );
    Ok(manifest)
}

fn parse_manifest_body(body: &str) -> LoadResult<Option<Value>> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        debug!("Manifest body is not JSON: {}", e);
        ManifestError::Parse
    })?;

    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(value))
}
