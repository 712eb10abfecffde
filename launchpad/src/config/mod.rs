//! Loader configuration
//!
//! Caller overrides are merged over defaults into an immutable
//! [`LoaderConfig`]. The caller's [`LoaderOptions`] are only ever borrowed.

use std::path::Path;

use launchpad_manifest::{DEFAULT_MANIFEST_FILE, DEFAULT_SUPPORTED_VERSION};
use serde::{Deserialize, Serialize};

/// Caller-supplied overrides. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_manifest_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_host_tablet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_local_cache: Option<bool>,
}

impl LoaderOptions {
    /// Read options from a JSON file with camelCase keys
    pub fn from_json_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read loader config {:?}: {}", path, e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse loader config JSON: {}", e))
    }
}

/// Resolved, read-only configuration for one loader instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    pub manifest_file: String,
    pub supported_manifest_version: String,
    pub app_host: String,
    pub app_host_tablet: String,
    pub public_path: String,
    pub use_local_cache: bool,
}

impl LoaderConfig {
    /// Merge `options` over the defaults and derive the public path.
    ///
    /// Public path precedence: explicit non-empty `publicPath`, then the
    /// host-derived path (tablet host on tablet-class devices), then "".
    pub fn resolve(options: &LoaderOptions, is_tablet: bool) -> Self {
        let manifest_file = options
            .manifest_file
            .clone()
            .unwrap_or_else(|| DEFAULT_MANIFEST_FILE.to_string());
        let supported_manifest_version = options
            .supported_manifest_version
            .clone()
            .unwrap_or_else(|| DEFAULT_SUPPORTED_VERSION.to_string());
        let app_host = options.app_host.clone().unwrap_or_default();
        let app_host_tablet = options.app_host_tablet.clone().unwrap_or_default();

        let public_path = match options.public_path.as_deref() {
            Some(explicit) if !explicit.is_empty() => explicit.to_string(),
            _ => derive_public_path(&app_host, &app_host_tablet, is_tablet),
        };

        Self {
            manifest_file,
            supported_manifest_version,
            app_host,
            app_host_tablet,
            public_path,
            use_local_cache: options.use_local_cache.unwrap_or(false),
        }
    }

    /// URL the manifest is fetched from
    pub fn manifest_url(&self) -> String {
        format!("{}{}", self.public_path, self.manifest_file)
    }
}

fn derive_public_path(app_host: &str, app_host_tablet: &str, is_tablet: bool) -> String {
    if app_host.is_empty() {
        return String::new();
    }

    let host = if is_tablet && !app_host_tablet.is_empty() {
        app_host_tablet
    } else {
        app_host
    };

    format!("{}/", host.trim_end_matches('/'))
}
