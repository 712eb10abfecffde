//! Host environment
//!
//! Capabilities of the process the loader runs in, resolved once and passed
//! to the loader explicitly.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::crash::CrashReporter;
use crate::transport::HttpBridge;

/// Environment variable naming the runtime (`embedded` or `browser`)
pub const RUNTIME_ENV: &str = "LAUNCHPAD_RUNTIME";

/// Environment variable naming the form factor (`tablet` or `phone`)
pub const FORM_FACTOR_ENV: &str = "LAUNCHPAD_FORM_FACTOR";

/// Which kind of host the loader is running in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRuntime {
    /// Plain browser: assets come straight from the network
    Browser,
    /// Hybrid-app runtime with persistent file storage
    Embedded,
}

#[derive(Clone)]
pub struct HostEnvironment {
    pub runtime: HostRuntime,
    pub is_tablet: bool,
    pub http_bridge: Option<Arc<dyn HttpBridge>>,
    pub crash_reporter: Option<Arc<dyn CrashReporter>>,
}

impl HostEnvironment {
    pub fn browser() -> Self {
        Self {
            runtime: HostRuntime::Browser,
            is_tablet: false,
            http_bridge: None,
            crash_reporter: None,
        }
    }

    pub fn embedded() -> Self {
        Self {
            runtime: HostRuntime::Embedded,
            ..Self::browser()
        }
    }

    /// Detect the host from `LAUNCHPAD_RUNTIME` and `LAUNCHPAD_FORM_FACTOR`
    pub fn detect() -> Self {
        let runtime = std::env::var(RUNTIME_ENV).unwrap_or_default();
        let form_factor = std::env::var(FORM_FACTOR_ENV).unwrap_or_default();
        let env = Self::from_values(&runtime, &form_factor);
        debug!(
            "Detected host runtime {:?} (tablet: {})",
            env.runtime, env.is_tablet
        );
        env
    }

    fn from_values(runtime: &str, form_factor: &str) -> Self {
        let runtime = if runtime.trim().eq_ignore_ascii_case("embedded") {
            HostRuntime::Embedded
        } else {
            HostRuntime::Browser
        };

        Self {
            runtime,
            is_tablet: form_factor.trim().eq_ignore_ascii_case("tablet"),
            http_bridge: None,
            crash_reporter: None,
        }
    }

    pub fn with_tablet(mut self, is_tablet: bool) -> Self {
        self.is_tablet = is_tablet;
        self
    }

    pub fn with_http_bridge(mut self, bridge: Arc<dyn HttpBridge>) -> Self {
        self.http_bridge = Some(bridge);
        self
    }

    pub fn with_crash_reporter(mut self, reporter: Arc<dyn CrashReporter>) -> Self {
        self.crash_reporter = Some(reporter);
        self
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::browser()
    }
}

impl fmt::Debug for HostEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEnvironment")
            .field("runtime", &self.runtime)
            .field("is_tablet", &self.is_tablet)
            .field("http_bridge", &self.http_bridge.is_some())
            .field("crash_reporter", &self.crash_reporter.is_some())
            .finish()
    }
}
