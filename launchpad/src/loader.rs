//! Loader Orchestrator
//!
//! Resolves configuration, picks the delivery strategy, then runs
//! fetch → validate → driver and publishes the resulting events.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cache_slot::CacheSlot;
use crate::common::{cache_dir, ErrorKind, LoadError, LoadResult};
use crate::config::{LoaderConfig, LoaderOptions};
use crate::crash;
use crate::driver::{AssetDriver, AssetStore, FsCacheDriver, HttpAssetDriver};
use crate::events::{EventBus, EventKind, LoadOutcome, ProgressSink, Subscription};
use crate::fetch::load_manifest;
use crate::host::HostEnvironment;
use crate::strategy::Strategy;
use crate::transport::{HttpTransport, ReqwestTransport};

/// One load attempt. Build it, then [`start`](Loader::start) or
/// [`run`](Loader::run) it.
pub struct Loader {
    config: LoaderConfig,
    strategy: Strategy,
    host: HostEnvironment,
    transport: Option<Arc<dyn HttpTransport>>,
    network_driver: Option<Arc<dyn AssetDriver>>,
    cache_driver: Option<Arc<dyn AssetDriver>>,
    cache_root: Option<PathBuf>,
    cache_slot: CacheSlot,
    assets: AssetStore,
}

pub struct LoaderBuilder {
    options: LoaderOptions,
    force_reload: bool,
    host: Option<HostEnvironment>,
    transport: Option<Arc<dyn HttpTransport>>,
    network_driver: Option<Arc<dyn AssetDriver>>,
    cache_driver: Option<Arc<dyn AssetDriver>>,
    cache_root: Option<PathBuf>,
    cache_slot: Option<CacheSlot>,
}

impl LoaderBuilder {
    /// Skip previously cached assets on the cache path
    pub fn force_reload(mut self, force_reload: bool) -> Self {
        self.force_reload = force_reload;
        self
    }

    /// Use this environment instead of detecting one
    pub fn host(mut self, host: HostEnvironment) -> Self {
        self.host = Some(host);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn network_driver(mut self, driver: Arc<dyn AssetDriver>) -> Self {
        self.network_driver = Some(driver);
        self
    }

    pub fn cache_driver(mut self, driver: Arc<dyn AssetDriver>) -> Self {
        self.cache_driver = Some(driver);
        self
    }

    /// Root of the persistent cache used by the default cache driver
    pub fn cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }

    /// Slot the default cache driver records its handle in
    pub fn cache_slot(mut self, slot: CacheSlot) -> Self {
        self.cache_slot = Some(slot);
        self
    }

    pub fn build(self) -> Loader {
        let host = self.host.unwrap_or_else(HostEnvironment::detect);
        let config = LoaderConfig::resolve(&self.options, host.is_tablet);

        let cache_slot = self.cache_slot.unwrap_or_else(CacheSlot::global);
        cache_slot.reset();

        let strategy = Strategy::select(host.runtime, &config, self.force_reload);
        info!(
            "Loader configured: runtime {:?}, strategy {}, public path '{}'",
            host.runtime,
            strategy.name(),
            config.public_path
        );

        Loader {
            config,
            strategy,
            host,
            transport: self.transport,
            network_driver: self.network_driver,
            cache_driver: self.cache_driver,
            cache_root: self.cache_root,
            cache_slot,
            assets: AssetStore::new(),
        }
    }
}

impl Loader {
    pub fn builder(options: &LoaderOptions) -> LoaderBuilder {
        LoaderBuilder {
            options: options.clone(),
            force_reload: false,
            host: None,
            transport: None,
            network_driver: None,
            cache_driver: None,
            cache_root: None,
            cache_slot: None,
        }
    }

    /// Loader with a detected host and the default transport and drivers
    pub fn new(options: &LoaderOptions, force_reload: bool) -> Self {
        Self::builder(options).force_reload(force_reload).build()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Assets delivered by the default network driver. Stays empty when a
    /// network driver was injected or the cache path is taken.
    pub fn assets(&self) -> AssetStore {
        self.assets.clone()
    }

    /// Spawn the load on the current tokio runtime and return at once.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> LoaderHandle {
        let bus = EventBus::new();
        let first = bus.subscribe();
        let assets = self.assets();

        let task_bus = bus.clone();
        let task = tokio::spawn(async move { self.run(&task_bus).await });

        LoaderHandle {
            bus,
            first: Mutex::new(Some(first)),
            assets,
            task,
        }
    }

    /// Run the load to completion, publishing on `bus`.
    ///
    /// Every failure ends up as the returned `Error` outcome and a single
    /// `error` event.
    pub async fn run(self, bus: &EventBus) -> LoadOutcome {
        let reporter = self.host.crash_reporter.clone();
        let progress = bus.progress_sink();

        // A panicking driver must still produce a terminal event
        let result = match tokio::spawn(self.load(progress)).await {
            Ok(result) => result,
            Err(e) => Err(LoadError::new(
                ErrorKind::Driver,
                format!("Load task aborted: {}", e),
            )),
        };

        let outcome = match result {
            Ok(()) => {
                info!("Load complete");
                LoadOutcome::Loaded
            }
            Err(err) => {
                error!("loader error: {}", err);
                if let Some(reporter) = &reporter {
                    crash::report(reporter.as_ref(), &err);
                }
                LoadOutcome::Error(err.event_message())
            }
        };

        bus.finish(&outcome);
        outcome
    }

    async fn load(self, progress: ProgressSink) -> LoadResult<()> {
        let transport = self.transport()?;
        let url = self.config.manifest_url();
        info!("Fetching manifest from {}", url);

        let manifest = load_manifest(
            &url,
            &self.config.supported_manifest_version,
            self.host.http_bridge.as_deref(),
            transport.as_ref(),
        )
        .await?;

        let driver = self.driver(transport)?;
        driver
            .load(
                &self.config.public_path,
                self.strategy.force_flag(),
                &manifest,
                &progress,
            )
            .await?;
        Ok(())
    }

    fn transport(&self) -> LoadResult<Arc<dyn HttpTransport>> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }
        let transport = ReqwestTransport::new().map_err(LoadError::setup)?;
        Ok(Arc::new(transport))
    }

    fn driver(&self, transport: Arc<dyn HttpTransport>) -> LoadResult<Arc<dyn AssetDriver>> {
        match self.strategy {
            Strategy::Network => Ok(match &self.network_driver {
                Some(driver) => Arc::clone(driver),
                None => Arc::new(HttpAssetDriver::with_store(transport, self.assets())),
            }),
            Strategy::Cache { .. } => {
                if let Some(driver) = &self.cache_driver {
                    return Ok(Arc::clone(driver));
                }
                let root = match &self.cache_root {
                    Some(root) => root.clone(),
                    None => cache_dir().map_err(LoadError::setup)?,
                };
                Ok(Arc::new(FsCacheDriver::new(
                    root,
                    transport,
                    self.cache_slot.clone(),
                )))
            }
        }
    }
}

/// Handle to a spawned load attempt
pub struct LoaderHandle {
    bus: EventBus,
    // created before the task was spawned so early events are kept
    first: Mutex<Option<Subscription>>,
    assets: AssetStore,
    task: JoinHandle<LoadOutcome>,
}

impl LoaderHandle {
    /// Subscribe to all events. The first subscription sees every event of
    /// the attempt; later ones see events from the moment they subscribe.
    pub fn subscribe(&self) -> Subscription {
        self.take_first().unwrap_or_else(|| self.bus.subscribe())
    }

    /// Subscribe to the listed event kinds only
    pub fn subscribe_to(&self, kinds: &[EventKind]) -> Subscription {
        match self.take_first() {
            Some(first) => first.only(kinds),
            None => self.bus.subscribe_to(kinds),
        }
    }

    /// Whether the terminal event has been published
    pub fn is_finished(&self) -> bool {
        self.bus.is_finished()
    }

    /// See [`Loader::assets`]
    pub fn assets(&self) -> AssetStore {
        self.assets.clone()
    }

    /// Wait for the terminal outcome
    pub async fn outcome(self) -> LoadOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => LoadOutcome::Error(format!("Load task failed: {}", e)),
        }
    }

    fn take_first(&self) -> Option<Subscription> {
        self.first
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}
