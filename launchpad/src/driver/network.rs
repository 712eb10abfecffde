//! Network-fresh driver
//!
//! Downloads every asset directly and keeps the bytes in memory for the
//! page to mount. Nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use launchpad_manifest::Manifest;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{asset_queue, AssetDriver, DriverError};
use crate::events::ProgressSink;
use crate::transport::HttpTransport;

/// Loaded asset bodies, indexed by asset ID.
///
/// Clones share the same contents, so a store handed to a driver can be read
/// by whoever kept another clone.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    inner: Arc<RwLock<HashMap<String, Arc<Vec<u8>>>>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body of a loaded asset
    pub async fn get(&self, id: &str) -> Option<Arc<Vec<u8>>> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    async fn replace(&self, assets: HashMap<String, Arc<Vec<u8>>>) {
        *self.inner.write().await = assets;
    }
}

pub struct HttpAssetDriver {
    transport: Arc<dyn HttpTransport>,
    assets: AssetStore,
}

impl HttpAssetDriver {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_store(transport, AssetStore::new())
    }

    /// Driver that publishes into an existing store
    pub fn with_store(transport: Arc<dyn HttpTransport>, assets: AssetStore) -> Self {
        Self { transport, assets }
    }

    pub fn store(&self) -> AssetStore {
        self.assets.clone()
    }

    pub async fn asset(&self, id: &str) -> Option<Arc<Vec<u8>>> {
        self.assets.get(id).await
    }

    pub async fn asset_ids(&self) -> Vec<String> {
        self.assets.ids().await
    }
}

#[async_trait]
impl AssetDriver for HttpAssetDriver {
    async fn load(
        &self,
        public_path: &str,
        _force: Option<bool>,
        manifest: &Manifest,
        progress: &ProgressSink,
    ) -> Result<(), DriverError> {
        let queue = asset_queue(manifest)?;
        let queue_size = queue.len();
        let mut loaded = HashMap::with_capacity(queue_size);

        for (index, entry) in queue.iter().enumerate() {
            let url = entry.url(public_path);
            let bytes = self.transport.get_bytes(&url).await?;
            entry.verify(&bytes)?;
            debug!("Fetched {} ({} bytes)", entry.id, bytes.len());

            loaded.insert(entry.id.clone(), Arc::new(bytes));
            progress.report(index + 1, queue_size);
        }

        // Swap in atomically so a failed load leaves the previous set intact
        self.assets.replace(loaded).await;

        info!("Network load complete: {} assets", queue_size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::sha256_hex;
    use crate::events::{EventBus, LoadOutcome, LoaderEvent};
    use crate::transport::TransportError;
    use serde_json::json;
    use std::sync::Mutex;

    struct MapTransport {
        bodies: HashMap<String, Vec<u8>>,
        requested: Mutex<Vec<String>>,
    }

    impl MapTransport {
        fn new(bodies: &[(&str, &[u8])]) -> Self {
            Self {
                bodies: bodies
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_vec()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpTransport for MapTransport {
        async fn get_text(&self, url: &str) -> Result<String, TransportError> {
            let bytes = self.get_bytes(url).await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.bodies.get(url).cloned().ok_or(TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn manifest(files: serde_json::Value) -> Manifest {
        Manifest {
            manifest_version: "2.0.0".into(),
            files: files.as_object().cloned().unwrap(),
            dom_nodes: vec![json!({"id": "root"})],
        }
    }

    #[tokio::test]
    async fn test_loads_all_assets_with_progress() {
        let transport = Arc::new(MapTransport::new(&[
            ("https://cdn/js/main.js", &b"main"[..]),
            ("https://cdn/css/app.css", &b"body{}"[..]),
        ]));
        let driver = HttpAssetDriver::new(transport.clone());
        let bus = EventBus::new();
        let sub = bus.subscribe();

        let manifest = manifest(json!({
            "app.css": "css/app.css",
            "main.js": {"filename": "js/main.js", "hash": sha256_hex(b"main")}
        }));
        driver
            .load("https://cdn/", None, &manifest, &bus.progress_sink())
            .await
            .unwrap();
        bus.finish(&LoadOutcome::Loaded);

        assert_eq!(driver.asset("main.js").await.unwrap().as_slice(), b"main");
        assert_eq!(driver.asset_ids().await, vec!["app.css", "main.js"]);
        assert_eq!(
            sub.collect().await,
            vec![
                LoaderEvent::Progress { queue_index: 1, queue_size: 2 },
                LoaderEvent::Progress { queue_index: 2, queue_size: 2 },
                LoaderEvent::Loaded,
            ]
        );
    }

    #[tokio::test]
    async fn test_shared_store_sees_loaded_assets() {
        let transport = Arc::new(MapTransport::new(&[("https://cdn/a.js", &b"a"[..])]));
        let store = AssetStore::new();
        let driver = HttpAssetDriver::with_store(transport, store.clone());
        let bus = EventBus::new();

        driver
            .load("https://cdn/", None, &manifest(json!({"a": "a.js"})), &bus.progress_sink())
            .await
            .unwrap();
        drop(driver);

        assert_eq!(store.ids().await, vec!["a"]);
        assert_eq!(store.get("a").await.unwrap().as_slice(), b"a");
    }

    #[tokio::test]
    async fn test_integrity_failure_stops_load() {
        let transport = Arc::new(MapTransport::new(&[("https://cdn/main.js", &b"evil"[..])]));
        let driver = HttpAssetDriver::new(transport);
        let bus = EventBus::new();

        let manifest = manifest(json!({
            "main.js": {"filename": "main.js", "hash": sha256_hex(b"good")}
        }));
        let err = driver
            .load("https://cdn/", None, &manifest, &bus.progress_sink())
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Integrity { .. }));
        assert!(driver.asset("main.js").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_asset_is_transport_error() {
        let transport = Arc::new(MapTransport::new(&[]));
        let driver = HttpAssetDriver::new(transport);
        let bus = EventBus::new();

        let err = driver
            .load("https://cdn/", None, &manifest(json!({"a": "a.js"})), &bus.progress_sink())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
