use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::http::connection::ConnectionSettings;
use crate::server::listener::ListenerSettings;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "FETCHLINE_CONFIG";
/// Environment variable overriding `server.port`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub traffic: TrafficConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub accept_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub grace_delay_ms: u64,
    /// Stop automatically after this long, if set.
    pub lifetime_ms: Option<u64>,
    /// Directory request paths are resolved against; working directory if unset.
    pub root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            accept_timeout_ms: 5000,
            read_timeout_ms: 5000,
            grace_delay_ms: 100,
            lifetime_ms: None,
            root: None,
        }
    }
}

impl ServerConfig {
    pub fn listener_settings(&self) -> ListenerSettings {
        ListenerSettings {
            accept_timeout: Duration::from_millis(self.accept_timeout_ms),
            connection: ConnectionSettings {
                read_timeout: Duration::from_millis(self.read_timeout_ms),
                grace_delay: Duration::from_millis(self.grace_delay_ms),
            },
        }
    }

    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            timeout_ms: 1000,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Demo traffic used by the `both` launch mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub paths: Vec<String>,
    /// `[min, max]` wait between connecting and sending the request.
    pub connect_delay_ms: [u64; 2],
    /// `[min, max]` wait between spawning demo clients.
    pub spawn_interval_ms: [u64; 2],
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            paths: vec![
                "./data/test.txt".to_string(),
                "./data/test.html".to_string(),
                "./data/missing.txt".to_string(),
            ],
            connect_delay_ms: [500, 2000],
            spawn_interval_ms: [100, 2000],
        }
    }
}

impl Config {
    /// Defaults, then the YAML file named by `FETCHLINE_CONFIG`, then `LISTEN`.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(port) = std::env::var(LISTEN_ENV) {
            cfg.server.port = parse_port(&port)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid {}", LISTEN_ENV))?;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_yaml(&text).with_context(|| format!("Failed to parse config file {}", path))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Parses a port number, rejecting anything outside 0..=65535.
///
/// Usable directly as a `clap` value parser.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let n: i64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Port {} is not a number", s))?;
    u16::try_from(n).map_err(|_| format!("Port {} should be in range 0..65535", n))
}
