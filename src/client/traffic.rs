//! Demo traffic: keeps a running listener busy with randomly timed clients.

use std::time::Duration;

use tracing::{debug, warn};

use crate::client::print_body;
use crate::client::session::ClientSession;
use crate::config::TrafficConfig;
use crate::server::listener::Listener;

/// Spawns demo clients against `host:port` until `listener` is stopped.
/// Expects `listener` to be started already.
///
/// Each client connects, idles for a random connect delay, then fetches a
/// random configured path. Individual client failures are logged only.
pub async fn run(host: String, port: u16, timeout: Duration, cfg: TrafficConfig, listener: Listener) {
    if cfg.paths.is_empty() {
        warn!("No demo paths configured, traffic generator idle");
        return;
    }

    while !listener.is_closed() {
        let path = cfg.paths[fastrand::usize(..cfg.paths.len())].clone();
        let connect_delay = random_between(cfg.connect_delay_ms);
        let host = host.clone();

        tokio::spawn(async move {
            let mut session = match ClientSession::connect(&host, port, timeout).await {
                Ok(s) => s,
                Err(e) => {
                    debug!(error = %e, "Demo client could not connect");
                    return;
                }
            };
            tokio::time::sleep(connect_delay).await;
            match session.fetch(&path).await {
                Ok(outcome) => print_body(&outcome),
                Err(e) => debug!(path = %path, error = %e, "Demo fetch failed"),
            }
        });

        tokio::select! {
            _ = tokio::time::sleep(random_between(cfg.spawn_interval_ms)) => {}
            _ = listener.closed() => break,
        }
    }
}

fn random_between([min, max]: [u64; 2]) -> Duration {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    Duration::from_millis(fastrand::u64(lo..=hi))
}
