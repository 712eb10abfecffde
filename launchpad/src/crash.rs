//! Crash reporting
//!
//! Load failures are forwarded to an optional reporter. Reporting is
//! best-effort: it never blocks and never stops the `error` event.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, warn};

use crate::common::{create_http_client_with_timeout, LoadError};

pub trait CrashReporter: Send + Sync {
    fn notify(&self, error: &LoadError);
}

/// Reporter used when the host provides none
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl CrashReporter for NoopReporter {
    fn notify(&self, _error: &LoadError) {}
}

/// Posts failures as JSON to an HTTP endpoint from a background task
#[derive(Debug, Clone)]
pub struct HttpCrashReporter {
    client: Client,
    endpoint: String,
}

impl HttpCrashReporter {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, String> {
        Ok(Self {
            client: create_http_client_with_timeout(10)?,
            endpoint: endpoint.into(),
        })
    }

    fn payload(error: &LoadError) -> serde_json::Value {
        serde_json::json!({
            "kind": error.kind,
            "message": error.message,
            "data": error.data,
            "timestamp": Utc::now().to_rfc3339(),
            "client": concat!("launchpad/", env!("CARGO_PKG_VERSION")),
        })
    }
}

impl CrashReporter for HttpCrashReporter {
    fn notify(&self, error: &LoadError) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, dropping crash report");
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let payload = Self::payload(error);

        runtime.spawn(async move {
            let result = client
                .post(&endpoint)
                .json(&payload)
                .timeout(Duration::from_secs(10))
                .send()
                .await;
            match result {
                Ok(resp) => debug!("Crash report delivered ({})", resp.status()),
                Err(e) => warn!("Failed to deliver crash report: {}", e),
            }
        });
    }
}

/// Hand `error` to `reporter`, swallowing any panic it raises
pub(crate) fn report(reporter: &dyn CrashReporter, error: &LoadError) {
    let outcome = catch_unwind(AssertUnwindSafe(|| reporter.notify(error)));
    if outcome.is_err() {
        warn!("Crash reporter panicked while reporting: {}", error);
    }
}
