//! Strategy Selector
//!
//! Picks the asset delivery path from the host runtime. Configuration only
//! tunes the chosen path; it never switches between them.

use crate::config::LoaderConfig;
use crate::host::HostRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fetch every asset straight from the network
    Network,
    /// Reconcile the persistent local cache against the manifest.
    /// `force` skips previously cached assets.
    Cache { force: bool },
}

impl Strategy {
    pub fn select(runtime: HostRuntime, config: &LoaderConfig, force_reload: bool) -> Self {
        match runtime {
            HostRuntime::Embedded => Strategy::Cache {
                force: !config.use_local_cache || force_reload,
            },
            HostRuntime::Browser => Strategy::Network,
        }
    }

    /// Force flag handed to the driver; only the cache path has one
    pub fn force_flag(&self) -> Option<bool> {
        match self {
            Strategy::Network => None,
            Strategy::Cache { force } => Some(*force),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Network => "network",
            Strategy::Cache { .. } => "cache",
        }
    }
}
