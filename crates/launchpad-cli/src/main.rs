mod args;

use std::process::ExitCode;

use clap::Parser;
use launchpad_lib::Loader;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // stdout carries the event stream, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = args.loader_options()?;

    let mut builder = Loader::builder(&options)
        .host(args.host()?)
        .force_reload(args.force_reload);
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_root(dir.clone());
    }

    let handle = builder.build().start();
    let mut events = handle.subscribe();
    let mut stdout = tokio::io::stdout();

    while let Some(event) = events.recv().await {
        stdout.write_all(serde_json::to_string(&event)?.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    let outcome = handle.outcome().await;
    tracing::debug!("Load finished: {:?}", outcome);
    Ok(if outcome.is_loaded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
