//! Cache-reconciling driver
//!
//! Compares a persistent on-disk asset cache against the manifest, downloads
//! only what is missing or stale, and prunes assets the manifest dropped.
//!
//! Layout under the cache root:
//! - `index.json`: asset ID → cached path, content hash, time cached
//! - `assets/`: asset files at their manifest-relative paths

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use launchpad_manifest::Manifest;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{asset_queue, sha256_hex, AssetDriver, AssetEntry, DriverError};
use crate::cache_slot::{CacheHandle, CacheSlot};
use crate::events::ProgressSink;
use crate::transport::HttpTransport;

pub const INDEX_FILE: &str = "index.json";
pub const ASSET_DIR: &str = "assets";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheIndex {
    #[serde(default)]
    entries: BTreeMap<String, IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    path: String,
    hash: String,
    cached_at: DateTime<Utc>,
}

pub struct FsCacheDriver {
    root: PathBuf,
    transport: Arc<dyn HttpTransport>,
    slot: CacheSlot,
}

impl FsCacheDriver {
    pub fn new(root: impl Into<PathBuf>, transport: Arc<dyn HttpTransport>, slot: CacheSlot) -> Self {
        Self {
            root: root.into(),
            transport,
            slot,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Directory holding the cached asset files
    pub fn asset_root(&self) -> PathBuf {
        self.root.join(ASSET_DIR)
    }

    fn asset_path(&self, path: &str) -> PathBuf {
        self.asset_root().join(path)
    }

    async fn read_index(&self) -> CacheIndex {
        let path = self.index_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheIndex::default(),
            Err(e) => {
                warn!("Failed to read cache index {:?}: {}", path, e);
                return CacheIndex::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Discarding unreadable cache index {:?}: {}", path, e);
            CacheIndex::default()
        })
    }

    async fn write_index(&self, index: &CacheIndex) -> Result<(), DriverError> {
        let content = serde_json::to_vec_pretty(index)
            .map_err(|e| DriverError::Index(format!("Failed to serialize index: {}", e)))?;
        write_atomic(&self.index_path(), &content).await
    }

    /// Whether the cached copy of `entry` can be reused as-is
    async fn is_fresh(&self, entry: &AssetEntry, cached: Option<&IndexEntry>) -> bool {
        let Some(cached) = cached else {
            return false;
        };
        if cached.path != entry.path {
            return false;
        }
        if let Some(expected) = &entry.hash {
            if &cached.hash != expected {
                return false;
            }
        }

        let local = self.asset_path(&entry.path);
        match tokio::fs::read(&local).await {
            Ok(bytes) => sha256_hex(&bytes) == cached.hash,
            Err(_) => false,
        }
    }

    async fn download(&self, public_path: &str, entry: &AssetEntry) -> Result<IndexEntry, DriverError> {
        let bytes = self.transport.get_bytes(&entry.url(public_path)).await?;
        entry.verify(&bytes)?;
        write_atomic(&self.asset_path(&entry.path), &bytes).await?;

        Ok(IndexEntry {
            path: entry.path.clone(),
            hash: sha256_hex(&bytes),
            cached_at: Utc::now(),
        })
    }

    async fn prune(&self, previous: &CacheIndex, current: &CacheIndex) {
        let kept: HashSet<&str> = current.entries.values().map(|e| e.path.as_str()).collect();

        for (id, stale) in &previous.entries {
            if kept.contains(stale.path.as_str()) {
                continue;
            }
            let path = self.asset_path(&stale.path);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Pruned {} ({:?})", id, path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to prune {:?}: {}", path, e),
            }
        }
    }
}

#[async_trait]
impl AssetDriver for FsCacheDriver {
    async fn load(
        &self,
        public_path: &str,
        force: Option<bool>,
        manifest: &Manifest,
        progress: &ProgressSink,
    ) -> Result<(), DriverError> {
        let queue = asset_queue(manifest)?;
        let queue_size = queue.len();
        let force = force.unwrap_or(false);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| DriverError::io(&self.root, e))?;
        self.slot.set(CacheHandle {
            root: self.root.clone(),
            index_path: self.index_path(),
            opened_at: Utc::now(),
        });

        let previous = self.read_index().await;
        let mut current = CacheIndex::default();
        let mut reused = 0usize;

        for (index, entry) in queue.iter().enumerate() {
            let cached = previous.entries.get(&entry.id);
            let record = if !force && self.is_fresh(entry, cached).await {
                debug!("Reusing cached {}", entry.id);
                reused += 1;
                cached.cloned()
            } else {
                None
            };

            let record = match record {
                Some(record) => record,
                None => self.download(public_path, entry).await?,
            };
            current.entries.insert(entry.id.clone(), record);
            progress.report(index + 1, queue_size);
        }

        self.prune(&previous, &current).await;
        self.write_index(&current).await?;

        info!(
            "Cache reconciled at {:?}: {} assets, {} reused, {} downloaded (force: {})",
            self.root,
            queue_size,
            reused,
            queue_size - reused,
            force
        );
        Ok(())
    }
}

/// Write through a temp file in the same directory, then rename into place
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DriverError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DriverError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("asset");
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| DriverError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| DriverError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventBus, LoaderEvent};
    use crate::transport::TransportError;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingTransport {
        bodies: Mutex<HashMap<String, Vec<u8>>>,
        requested: Mutex<Vec<String>>,
    }

    impl CountingTransport {
        fn serve(&self, url: &str, body: &[u8]) {
            self.bodies
                .lock()
                .unwrap()
                .insert(url.to_string(), body.to_vec());
        }

        fn take_requests(&self) -> Vec<String> {
            std::mem::take(&mut *self.requested.lock().unwrap())
        }
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn get_text(&self, url: &str) -> Result<String, TransportError> {
            let bytes = self.get_bytes(url).await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.bodies
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or(TransportError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn manifest(files: serde_json::Value) -> Manifest {
        Manifest {
            manifest_version: "2.1.0".into(),
            files: files.as_object().cloned().unwrap(),
            dom_nodes: vec![],
        }
    }

    fn setup() -> (tempfile::TempDir, Arc<CountingTransport>, FsCacheDriver, CacheSlot) {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(CountingTransport::default());
        transport.serve("https://cdn/js/main.js", b"main-v1");
        transport.serve("https://cdn/css/app.css", b"body{}");
        let slot = CacheSlot::new();
        let driver = FsCacheDriver::new(dir.path().join("cache"), transport.clone(), slot.clone());
        (dir, transport, driver, slot)
    }

    fn two_files() -> Manifest {
        manifest(json!({
            "app.css": "css/app.css",
            "main.js": {"filename": "js/main.js", "hash": sha256_hex(b"main-v1")}
        }))
    }

    #[tokio::test]
    async fn test_first_load_downloads_everything() {
        let (_dir, transport, driver, slot) = setup();
        let bus = EventBus::new();
        let sub = bus.subscribe();

        driver
            .load("https://cdn/", Some(false), &two_files(), &bus.progress_sink())
            .await
            .unwrap();
        bus.finish(&crate::events::LoadOutcome::Loaded);

        assert_eq!(transport.take_requests().len(), 2);
        assert_eq!(
            std::fs::read(driver.asset_root().join("js/main.js")).unwrap(),
            b"main-v1"
        );
        assert!(driver.index_path().exists());

        let handle = slot.get().unwrap();
        assert_eq!(handle.root, driver.root());

        let events = sub.collect().await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], LoaderEvent::Progress { queue_index: 2, queue_size: 2 });
    }

    #[tokio::test]
    async fn test_second_load_reuses_cache() {
        let (_dir, transport, driver, _slot) = setup();
        let bus = EventBus::new();

        driver
            .load("https://cdn/", Some(false), &two_files(), &bus.progress_sink())
            .await
            .unwrap();
        transport.take_requests();

        driver
            .load("https://cdn/", Some(false), &two_files(), &bus.progress_sink())
            .await
            .unwrap();
        assert!(transport.take_requests().is_empty());
    }

    #[tokio::test]
    async fn test_force_redownloads() {
        let (_dir, transport, driver, _slot) = setup();
        let bus = EventBus::new();

        driver
            .load("https://cdn/", Some(false), &two_files(), &bus.progress_sink())
            .await
            .unwrap();
        transport.take_requests();

        driver
            .load("https://cdn/", Some(true), &two_files(), &bus.progress_sink())
            .await
            .unwrap();
        assert_eq!(transport.take_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_tampered_file_is_refetched() {
        let (_dir, transport, driver, _slot) = setup();
        let bus = EventBus::new();

        driver
            .load("https://cdn/", Some(false), &two_files(), &bus.progress_sink())
            .await
            .unwrap();
        transport.take_requests();
        std::fs::write(driver.asset_root().join("js/main.js"), b"corrupt").unwrap();

        driver
            .load("https://cdn/", Some(false), &two_files(), &bus.progress_sink())
            .await
            .unwrap();
        assert_eq!(transport.take_requests(), vec!["https://cdn/js/main.js"]);
        assert_eq!(
            std::fs::read(driver.asset_root().join("js/main.js")).unwrap(),
            b"main-v1"
        );
    }

    #[tokio::test]
    async fn test_new_hash_is_fetched_and_dropped_assets_pruned() {
        let (_dir, transport, driver, _slot) = setup();
        let bus = EventBus::new();

        driver
            .load("https://cdn/", Some(false), &two_files(), &bus.progress_sink())
            .await
            .unwrap();
        transport.take_requests();

        transport.serve("https://cdn/js/main.2.js", b"main-v2");
        let next = manifest(json!({
            "main.js": {"filename": "js/main.2.js", "hash": sha256_hex(b"main-v2")}
        }));
        driver
            .load("https://cdn/", Some(false), &next, &bus.progress_sink())
            .await
            .unwrap();

        assert_eq!(transport.take_requests(), vec!["https://cdn/js/main.2.js"]);
        assert!(!driver.asset_root().join("js/main.js").exists());
        assert!(!driver.asset_root().join("css/app.css").exists());
        assert!(driver.asset_root().join("js/main.2.js").exists());
    }

    #[tokio::test]
    async fn test_integrity_failure_writes_nothing() {
        let (_dir, transport, driver, _slot) = setup();
        transport.serve("https://cdn/js/main.js", b"evil");
        let bus = EventBus::new();

        let err = driver
            .load("https://cdn/", Some(false), &two_files(), &bus.progress_sink())
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Integrity { .. }));
        assert!(!driver.asset_root().join("js/main.js").exists());
    }

    #[tokio::test]
    async fn test_asset_named_like_index_is_kept_apart() {
        let (_dir, transport, driver, _slot) = setup();
        transport.serve("https://cdn/index.json", b"{\"app\":true}");
        let files = manifest(json!({"idx": "index.json"}));
        let bus = EventBus::new();

        driver
            .load("https://cdn/", Some(false), &files, &bus.progress_sink())
            .await
            .unwrap();
        assert_eq!(
            std::fs::read(driver.asset_root().join("index.json")).unwrap(),
            b"{\"app\":true}"
        );
        let index: CacheIndex =
            serde_json::from_slice(&std::fs::read(driver.index_path()).unwrap()).unwrap();
        assert_eq!(index.entries["idx"].path, "index.json");
        transport.take_requests();

        driver
            .load("https://cdn/", Some(false), &files, &bus.progress_sink())
            .await
            .unwrap();
        assert!(transport.take_requests().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_index_is_ignored() {
        let (_dir, transport, driver, _slot) = setup();
        std::fs::create_dir_all(driver.root()).unwrap();
        std::fs::write(driver.index_path(), b"{ not json").unwrap();
        let bus = EventBus::new();

        driver
            .load("https://cdn/", Some(false), &two_files(), &bus.progress_sink())
            .await
            .unwrap();
        assert_eq!(transport.take_requests().len(), 2);
    }
}
