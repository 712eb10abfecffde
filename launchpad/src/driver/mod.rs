//! Asset Load Drivers
//!
//! A driver takes the validated manifest and the resolved public path and
//! delivers every asset, reporting progress per item.
//!
//! The shape of `files` values belongs to the drivers. An entry is either a
//! relative path string or an object:
//!
//! ```json
//! { "filename": "js/main.3f2a.js", "hash": "<sha256 hex>", "size": 48213 }
//! ```

pub mod cache;
pub mod network;

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use launchpad_manifest::Manifest;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::events::ProgressSink;
use crate::transport::TransportError;

pub use cache::FsCacheDriver;
pub use network::{AssetStore, HttpAssetDriver};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest entry '{asset}': {reason}")]
    InvalidEntry { asset: String, reason: String },

    #[error("Integrity check failed for '{asset}': expected {expected}, got {actual}")]
    Integrity {
        asset: String,
        expected: String,
        actual: String,
    },

    #[error("Cache index error: {0}")]
    Index(String),
}

impl DriverError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
pub trait AssetDriver: Send + Sync {
    /// Deliver every asset in `manifest` from under `public_path`.
    ///
    /// `force` is `Some` only on the cache-reconciling path.
    async fn load(
        &self,
        public_path: &str,
        force: Option<bool>,
        manifest: &Manifest,
        progress: &ProgressSink,
    ) -> Result<(), DriverError>;
}

/// One item of a driver's load queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub id: String,
    pub path: String,
    pub hash: Option<String>,
    pub size: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Path(String),
    Detailed {
        #[serde(alias = "path")]
        filename: String,
        #[serde(default)]
        hash: Option<String>,
        #[serde(default)]
        size: Option<u64>,
    },
}

impl AssetEntry {
    fn parse(id: &str, value: &serde_json::Value) -> Result<Self, DriverError> {
        let raw: RawEntry =
            serde_json::from_value(value.clone()).map_err(|_| DriverError::InvalidEntry {
                asset: id.to_string(),
                reason: "expected a path or an object with a filename".to_string(),
            })?;

        let (path, hash, size) = match raw {
            RawEntry::Path(path) => (path, None, None),
            RawEntry::Detailed {
                filename,
                hash,
                size,
            } => (filename, hash.map(|h| h.to_ascii_lowercase()), size),
        };

        check_relative(id, &path)?;

        Ok(Self {
            id: id.to_string(),
            path,
            hash,
            size,
        })
    }

    /// URL of this asset under `public_path`, path segments percent-encoded
    pub fn url(&self, public_path: &str) -> String {
        let encoded: Vec<String> = self
            .path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}{}", public_path, encoded.join("/"))
    }

    /// Check `bytes` against the entry's hash, when it has one
    pub fn verify(&self, bytes: &[u8]) -> Result<(), DriverError> {
        let Some(expected) = &self.hash else {
            return Ok(());
        };

        let actual = sha256_hex(bytes);
        if &actual != expected {
            return Err(DriverError::Integrity {
                asset: self.id.clone(),
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }
}

/// The manifest's `files` as an ordered load queue
pub fn asset_queue(manifest: &Manifest) -> Result<Vec<AssetEntry>, DriverError> {
    manifest
        .files
        .iter()
        .map(|(id, value)| AssetEntry::parse(id, value))
        .collect()
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn check_relative(id: &str, path: &str) -> Result<(), DriverError> {
    let invalid = |reason: &str| DriverError::InvalidEntry {
        asset: id.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("empty path"));
    }

    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(invalid("path must be relative and stay inside the asset root")),
        }
    }
    Ok(())
}
