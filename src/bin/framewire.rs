//! framewire binary - run the intercepting proxy from the command line.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use framewire::protocol::Direction;
use framewire::transform::{TransformChain, UppercaseAscii};
use framewire::{Proxy, ProxyConfig};

/// Intercepting TCP proxy for length-prefixed frames.
#[derive(Debug, Parser)]
#[command(name = "framewire", version, about)]
struct Args {
    /// Local TCP port to listen on.
    #[arg(default_value_t = framewire::config::DEFAULT_LISTEN_PORT)]
    listen_port: u16,

    /// Upstream host dialed for each new flow.
    #[arg(default_value = "127.0.0.1")]
    upstream_host: String,

    /// Upstream TCP port.
    #[arg(default_value_t = framewire::config::DEFAULT_UPSTREAM_PORT)]
    upstream_port: u16,

    /// Local address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    listen_host: String,

    /// Maximum bytes drawn from a single read.
    #[arg(long, default_value_t = framewire::config::DEFAULT_MAX_CHUNK)]
    max_chunk: usize,

    /// Cap on the declared payload length of a single frame.
    #[arg(long, default_value_t = framewire::protocol::DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: u32,

    /// Maximum concurrent flows.
    #[arg(long, default_value_t = framewire::config::DEFAULT_MAX_CONNECTIONS)]
    max_connections: usize,

    /// Install the ASCII upper-casing transform.
    #[arg(long, value_enum)]
    uppercase: Option<UppercaseScope>,
}

/// Which frames the demo transform touches.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum UppercaseScope {
    /// Both directions.
    All,
    /// Client-to-server frames only.
    C2s,
    /// Server-to-client frames only.
    S2c,
}

fn build_chain(args: &Args) -> TransformChain {
    let chain = TransformChain::new();
    match args.uppercase {
        None => chain,
        Some(UppercaseScope::All) => chain.with(UppercaseAscii::new()),
        Some(UppercaseScope::C2s) => {
            chain.with(UppercaseAscii::for_direction(Direction::ClientToServer))
        }
        Some(UppercaseScope::S2c) => {
            chain.with(UppercaseAscii::for_direction(Direction::ServerToClient))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let chain = build_chain(&args);
    let config = ProxyConfig {
        listen_host: args.listen_host,
        listen_port: args.listen_port,
        upstream_host: args.upstream_host,
        upstream_port: args.upstream_port,
        max_chunk: args.max_chunk,
        max_frame_size: args.max_frame_size,
        max_connections: args.max_connections,
    };

    info!(
        listen = %config.listen_addr(),
        upstream = %config.upstream_addr(),
        "starting framewire"
    );

    let proxy = Arc::new(Proxy::bind(config, chain).await?);
    proxy.run().await?;
    Ok(())
}
