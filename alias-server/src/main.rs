use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use alias_server::{
    channels::ChannelRegistry, config::Config, create_routes,
    websocket::{ConnectionManager, handlers::release_connections},
};

#[derive(Parser, Debug)]
#[command(name = "alias-server")]
#[command(about = "Broadcast and presence relay for Alias rooms", long_about = None)]
struct Args {
    /// Host address to bind to, overrides HOST
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to bind to, overrides PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alias_server=info,alias_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Alias relay...");

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let connection_manager = Arc::new(ConnectionManager::new());
    let registry = Arc::new(ChannelRegistry::new(config.max_members_per_room));
    let routes = create_routes(connection_manager.clone(), registry.clone());

    // Start cleanup task
    let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            let removed = connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            release_connections(&registry, &connection_manager, removed).await;
        }
    });

    let ip: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("invalid HOST {}", config.host))?;

    let (addr, server) = warp::serve(routes).try_bind_with_graceful_shutdown((ip, config.port), async {
        #[cfg(unix)]
        {
            let (Ok(mut sigint), Ok(mut sigterm)) = (
                signal::unix::signal(signal::unix::SignalKind::interrupt()),
                signal::unix::signal(signal::unix::SignalKind::terminate()),
            ) else {
                let _ = signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down gracefully...");
                return;
            };

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    })
    .with_context(|| format!("could not bind {}:{}", config.host, config.port))?;

    info!("Relay started on {}. Press Ctrl+C to stop.", addr);
    server.await;
    info!("Relay shutdown complete.");
    Ok(())
}
