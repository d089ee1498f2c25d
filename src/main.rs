//! Bedrock HTTP gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                   BEDROCK GATEWAY                     │
//!                    │                                                       │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌────────────┐        │
//!   ─────────────────┼─▶│  http   │───▶│ routing  │───▶│    rpc     │        │
//!                    │  │ server  │    │ (command)│    │ dispatcher │        │
//!                    │  └─────────┘    └──────────┘    └─────┬──────┘        │
//!                    │                                       │               │
//!                    │                                       ▼               │
//!                    │                               ┌──────────────┐        │
//!                    │                               │   cluster    │        │
//!                    │                               │ pool + black │        │
//!                    │                               │    list      │        │
//!                    │                               └──────┬───────┘        │
//!                    │                                      │                │
//!   Client Response  │  ┌──────────┐                        ▼                │
//!   ◀────────────────┼──│ response │◀────────────── reply / failure ◀───────┼──── Bedrock
//!                    │  │translate │                                        │     node
//!                    │  └──────────┘                                        │
//!                    │                                                       │
//!                    │  config · observability · lifecycle · net (TLS)      │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use bedrock_gateway::config::resolve_config;
use bedrock_gateway::http::HttpServer;
use bedrock_gateway::lifecycle::{wait_for_signal, Shutdown};
use bedrock_gateway::net::load_tls_config;
use bedrock_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "bedrock-gateway")]
#[command(about = "HTTP gateway in front of a Bedrock cluster", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match resolve_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("bedrock-gateway: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "bedrock-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        cluster = %config.cluster.name,
        primary = config.cluster.primary.len(),
        failover = config.cluster.failover.len(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let tls = config.listener.tls.clone();
    let bind_address: SocketAddr = config.listener.bind_address.parse()?;
    let server = HttpServer::new(config);

    let mut server_task = match tls {
        Some(tls) => {
            let rustls = load_tls_config(&tls).await?;
            tokio::spawn(server.run_tls(bind_address, rustls, server_shutdown))
        }
        None => {
            let listener = TcpListener::bind(bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            tokio::spawn(server.run(listener, server_shutdown))
        }
    };

    tokio::select! {
        _ = wait_for_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => {
            result??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
