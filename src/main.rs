use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::info;

use fetchline::client::{self, ClientSession, traffic};
use fetchline::config::{Config, ServerConfig, parse_port};
use fetchline::server::{FsResolver, Listener, Resolver};

const DEFAULT_MODEL_TIME_MS: u64 = 7000;
const DRAIN_POLL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "fetchline", about = "Single-request line protocol server and client")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Serve files until stopped
    Server {
        #[arg(value_parser = parse_port)]
        port: Option<u16>,
        /// Stop automatically after this many milliseconds
        lifetime_ms: Option<u64>,
    },
    /// Fetch one file and print its body
    Client {
        host: String,
        #[arg(value_parser = parse_port)]
        port: u16,
        path: String,
    },
    /// Run a server plus randomly timed demo clients
    Both {
        #[arg(value_parser = parse_port)]
        port: Option<u16>,
        /// How long the server runs, in milliseconds
        model_time_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load()?;

    match cli.mode {
        Mode::Server { port, lifetime_ms } => {
            if let Some(port) = port {
                cfg.server.port = port;
            }
            if lifetime_ms.is_some() {
                cfg.server.lifetime_ms = lifetime_ms;
            }

            let listener = start_server(&cfg.server).await?;
            wait_for_stop(&listener).await;
            drain(&listener, &cfg.server).await;
        }

        Mode::Client { host, port, path } => {
            let mut session = ClientSession::connect(&host, port, cfg.client.timeout()).await?;
            let outcome = session.fetch(&path).await?;
            client::print_body(&outcome);
        }

        Mode::Both { port, model_time_ms } => {
            if let Some(port) = port {
                cfg.server.port = port;
            }
            cfg.server.lifetime_ms = Some(model_time_ms.unwrap_or(DEFAULT_MODEL_TIME_MS));

            let listener = start_server(&cfg.server).await?;
            let demo = tokio::spawn(traffic::run(
                cfg.client.host.clone(),
                listener.local_addr().port(),
                cfg.client.timeout(),
                cfg.traffic.clone(),
                listener.clone(),
            ));

            wait_for_stop(&listener).await;
            let _ = demo.await;
            drain(&listener, &cfg.server).await;
        }
    }

    Ok(())
}

async fn start_server(cfg: &ServerConfig) -> anyhow::Result<Listener> {
    let resolver: Arc<dyn Resolver> = match &cfg.root {
        Some(root) => Arc::new(FsResolver::rooted(root)),
        None => Arc::new(FsResolver::new()),
    };

    let listener = Listener::open(cfg.port, resolver, cfg.listener_settings()).await?;
    listener.start()?;

    if let Some(lifetime) = cfg.lifetime() {
        listener.stop_after(lifetime);
    }
    Ok(listener)
}

async fn wait_for_stop(listener: &Listener) {
    tokio::select! {
        _ = listener.closed() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            listener.stop();
        }
    }
}

/// Gives in-flight handlers a bounded window to finish before the runtime exits.
async fn drain(listener: &Listener, cfg: &ServerConfig) {
    let limit = Duration::from_millis(cfg.read_timeout_ms.saturating_add(cfg.grace_delay_ms));
    let started = Instant::now();

    while listener.active_connections() > 0 && started.elapsed() < limit {
        tokio::time::sleep(DRAIN_POLL).await;
    }
    info!(remaining = listener.active_connections(), "Exiting");
}
