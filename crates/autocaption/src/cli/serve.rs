//! The `autocaption serve` command: run the web service.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use autocaption_core::{Autocaption, Config, ConsolePublisher, ProviderFactory};
use clap::Args;

use super::types::Provider;
use crate::server;

/// Arguments for the `serve` command.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Caption provider (overrides caption.provider)
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Model name for the selected provider
    #[arg(long)]
    pub model: Option<String>,

    /// Directory for uploaded images (overrides server.upload_dir)
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Seconds between upload and the simulated post (overrides notifier.delay_secs)
    #[arg(long)]
    pub delay: Option<u64>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let config = apply_overrides(config, &args);
    config.validate()?;
    let addr = bind_address(&config)?;

    let provider = ProviderFactory::create(
        &config.caption.provider,
        &config.llm,
        args.model.as_deref(),
    )?;
    if !provider.is_available().await {
        tracing::warn!(
            provider = provider.name(),
            "Caption provider is not reachable yet; uploads will fail until it is"
        );
    }
    tracing::info!(
        provider = provider.name(),
        model = provider.model(),
        upload_dir = %config.upload_dir().display(),
        delay_secs = config.notifier.delay_secs,
        "Starting autocaption"
    );

    let app = Autocaption::new(config, provider, Arc::new(ConsolePublisher::stdout())).await?;
    server::serve(app, addr).await
}

fn apply_overrides(mut config: Config, args: &ServeArgs) -> Config {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(provider) = args.provider {
        config.caption.provider = provider.to_string();
    }
    if let Some(dir) = &args.upload_dir {
        config.server.upload_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(delay) = args.delay {
        config.notifier.delay_secs = delay;
    }
    config
}

fn bind_address(config: &Config) -> anyhow::Result<SocketAddr> {
    let raw = format!("{}:{}", config.server.host, config.server.port);
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address {raw:?}: {e}"))
}
