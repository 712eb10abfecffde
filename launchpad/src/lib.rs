//! Launchpad
//!
//! Boots a client application from a versioned manifest. The manifest is
//! fetched, validated against the supported version range, and handed to one
//! of two asset drivers depending on the host: straight network delivery for
//! browsers, or reconciliation against a persistent local cache for embedded
//! app runtimes.
//!
//! ```no_run
//! # async fn example() {
//! use launchpad_lib::{Loader, LoaderOptions};
//!
//! let options = LoaderOptions {
//!     app_host: Some("https://cdn.example.com".to_string()),
//!     ..Default::default()
//! };
//! let handle = Loader::new(&options, false).start();
//! let mut events = handle.subscribe();
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

pub mod cache_slot;
pub mod common;
pub mod config;
pub mod crash;
pub mod driver;
pub mod events;
pub mod fetch;
pub mod host;
pub mod loader;
pub mod strategy;
pub mod transport;

pub use cache_slot::{CacheHandle, CacheSlot};
pub use common::{ErrorKind, LoadError, LoadResult};
pub use config::{LoaderConfig, LoaderOptions};
pub use crash::{CrashReporter, HttpCrashReporter, NoopReporter};
pub use driver::{AssetDriver, AssetStore, DriverError, FsCacheDriver, HttpAssetDriver};
pub use events::{EventBus, EventKind, LoadOutcome, LoaderEvent, ProgressSink, Subscription};
pub use host::{HostEnvironment, HostRuntime};
pub use launchpad_manifest::{Manifest, ManifestError};
pub use loader::{Loader, LoaderBuilder, LoaderHandle};
pub use strategy::Strategy;
pub use transport::{BridgeResponse, HttpBridge, HttpTransport, ReqwestTransport, TransportError};
