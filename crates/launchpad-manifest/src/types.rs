//! Manifest Types
//!
//! The application manifest as served next to the app's assets.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Filename of the manifest relative to the public path
pub const DEFAULT_MANIFEST_FILE: &str = "app-manifest.json";

/// Range of manifest versions this runtime understands
pub const DEFAULT_SUPPORTED_VERSION: &str = "^2.0.0";

/// Validated application manifest.
///
/// `files` values and `domNodes` entries belong to the asset drivers; the
/// loader only guarantees their outer shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub manifest_version: String,
    pub files: Map<String, Value>,
    pub dom_nodes: Vec<Value>,
}

impl Manifest {
    /// Number of asset files, i.e. the size of a driver's load queue
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
