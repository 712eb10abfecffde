use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use launchpad_lib::{HostEnvironment, HostRuntime, HttpCrashReporter, LoaderOptions};

#[derive(Parser, Debug)]
#[command(name = "launchpad", version, about = "Load an application's assets from its manifest")]
pub struct Args {
    /// JSON file with loader options (camelCase keys)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub app_host: Option<String>,

    #[arg(long)]
    pub app_host_tablet: Option<String>,

    #[arg(long)]
    pub public_path: Option<String>,

    #[arg(long)]
    pub manifest_file: Option<String>,

    /// Version range the manifest must satisfy, e.g. "^2.0.0"
    #[arg(long)]
    pub supported_version: Option<String>,

    /// Prefer cached assets; `--use-local-cache=false` overrides the options file
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub use_local_cache: Option<bool>,

    #[arg(long)]
    pub force_reload: bool,

    /// Behave as an embedded runtime (cache-reconciling path)
    #[arg(long)]
    pub embedded: bool,

    #[arg(long)]
    pub tablet: bool,

    /// Cache root for the embedded path (default ~/.launchpad/cache)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// POST load failures to this URL
    #[arg(long)]
    pub crash_endpoint: Option<String>,
}

impl Args {
    /// Options file first, then flags on top
    pub fn loader_options(&self) -> anyhow::Result<LoaderOptions> {
        let mut options = match &self.config {
            Some(path) => LoaderOptions::from_json_file(path).map_err(anyhow::Error::msg)?,
            None => LoaderOptions::default(),
        };

        override_with(&mut options.app_host, &self.app_host);
        override_with(&mut options.app_host_tablet, &self.app_host_tablet);
        override_with(&mut options.public_path, &self.public_path);
        override_with(&mut options.manifest_file, &self.manifest_file);
        override_with(&mut options.supported_manifest_version, &self.supported_version);
        if let Some(use_local_cache) = self.use_local_cache {
            options.use_local_cache = Some(use_local_cache);
        }

        Ok(options)
    }

    pub fn host(&self) -> anyhow::Result<HostEnvironment> {
        let mut host = HostEnvironment::detect();
        if self.embedded {
            host.runtime = HostRuntime::Embedded;
        }
        if self.tablet {
            host.is_tablet = true;
        }
        if let Some(endpoint) = &self.crash_endpoint {
            let reporter = HttpCrashReporter::new(endpoint.clone()).map_err(anyhow::Error::msg)?;
            host = host.with_crash_reporter(Arc::new(reporter));
        }
        Ok(host)
    }
}

fn override_with(target: &mut Option<String>, flag: &Option<String>) {
    if let Some(value) = flag {
        *target = Some(value.clone());
    }
}
