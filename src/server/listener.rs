use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::http::connection::{Connection, ConnectionSettings};
use crate::server::resolver::Resolver;

/// Pause after a failed accept (e.g. descriptor exhaustion) before retrying.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Failures surfaced by [`Listener`] to its owner.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind the requested port.
    Bind(std::io::Error),
    /// `start` was called twice.
    AlreadyStarted,
    /// `start` was called after `stop`.
    Closed,
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::AlreadyStarted => write!(f, "Listener already started"),
            ListenerError::Closed => write!(f, "Listener is closed"),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind(e) => Some(e),
            _ => None,
        }
    }
}

/// Listener tuning. Accept timeout is the interval at which an idle accept
/// loop rechecks for shutdown.
#[derive(Debug, Clone, Copy)]
pub struct ListenerSettings {
    pub accept_timeout: Duration,
    pub connection: ConnectionSettings,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            accept_timeout: Duration::from_secs(5),
            connection: ConnectionSettings::default(),
        }
    }
}

struct Shared {
    local_addr: SocketAddr,
    /// Present until the accept loop takes ownership (or `stop` drops it).
    socket: Mutex<Option<TcpListener>>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    shutdown: watch::Sender<bool>,
    active: Arc<AtomicUsize>,
    resolver: Arc<dyn Resolver>,
    settings: ListenerSettings,
}

/// Owns a bound socket and the accept loop feeding connection handlers.
///
/// Cloning yields another handle to the same listener, so `stop` may be
/// called from any task.
#[derive(Clone)]
pub struct Listener {
    shared: Arc<Shared>,
}

impl Listener {
    /// Binds `port` on all IPv4 interfaces. Port 0 picks an ephemeral port.
    pub async fn open(
        port: u16,
        resolver: Arc<dyn Resolver>,
        settings: ListenerSettings,
    ) -> Result<Self, ListenerError> {
        Self::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), resolver, settings).await
    }

    pub async fn bind(
        addr: SocketAddr,
        resolver: Arc<dyn Resolver>,
        settings: ListenerSettings,
    ) -> Result<Self, ListenerError> {
        let socket = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = socket.local_addr().map_err(ListenerError::Bind)?;

        info!(address = %local_addr, "Listener bound");

        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            shared: Arc::new(Shared {
                local_addr,
                socket: Mutex::new(Some(socket)),
                accept_task: Mutex::new(None),
                closed: AtomicBool::new(false),
                shutdown,
                active: Arc::new(AtomicUsize::new(0)),
                resolver,
                settings,
            }),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.shared.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Number of connection handlers that have not finished yet.
    pub fn active_connections(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Spawns the accept loop and returns immediately.
    pub fn start(&self) -> Result<(), ListenerError> {
        if self.is_closed() {
            return Err(ListenerError::Closed);
        }

        let socket = match lock(&self.shared.socket).take() {
            Some(socket) => socket,
            None if self.is_closed() => return Err(ListenerError::Closed),
            None => return Err(ListenerError::AlreadyStarted),
        };

        let handle = tokio::spawn(accept_loop(
            socket,
            Arc::clone(&self.shared),
            self.shared.shutdown.subscribe(),
        ));
        *lock(&self.shared.accept_task) = Some(handle);

        // stop() may have run between the check above and storing the handle
        if self.is_closed() {
            self.stop();
        }
        Ok(())
    }

    /// Stops accepting and closes the bound socket. Idempotent.
    ///
    /// Handlers already spawned keep running to completion.
    pub fn stop(&self) {
        let first = !self.shared.closed.swap(true, Ordering::SeqCst);
        self.shared.shutdown.send_replace(true);

        if let Some(task) = lock(&self.shared.accept_task).take() {
            task.abort();
        }
        drop(lock(&self.shared.socket).take());

        if first {
            info!(address = %self.shared.local_addr, "Listener stopped");
        }
    }

    /// Same as [`Listener::stop`].
    pub fn close(&self) {
        self.stop();
    }

    /// Stops the listener once `after` has elapsed.
    pub fn stop_after(&self, after: Duration) -> JoinHandle<()> {
        let listener = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            debug!(after = ?after, "Listener lifetime elapsed");
            listener.stop();
        })
    }

    /// Resolves once the listener has been stopped.
    pub async fn closed(&self) {
        until_closed(&mut self.shared.shutdown.subscribe()).await;
    }
}

async fn until_closed(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|closed| *closed).await;
}

async fn accept_loop(socket: TcpListener, shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    loop {
        if shared.closed.load(Ordering::SeqCst) {
            break;
        }
        debug!(port = shared.local_addr.port(), "Waiting for client");

        let accepted = tokio::select! {
            _ = until_closed(&mut shutdown) => break,
            res = timeout(shared.settings.accept_timeout, socket.accept()) => res,
        };

        let (stream, peer) = match accepted {
            Err(_elapsed) => continue,
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                warn!(error = %e, "Accept failed");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                continue;
            }
        };

        // Checked again so nothing accepted during shutdown gets a handler.
        if shared.closed.load(Ordering::SeqCst) {
            break;
        }

        let guard = ActiveConnection::acquire(&shared.active);
        info!(peer = %peer, active = guard.count(), "Client connected");

        let resolver = Arc::clone(&shared.resolver);
        let settings = shared.settings.connection;
        tokio::spawn(async move {
            let _guard = guard;
            let conn = Connection::new(stream, peer, resolver, settings);
            if let Err(e) = conn.run().await {
                error!(peer = %peer, error = %e, "Connection error");
            }
        });
    }

    debug!("Accept loop ended");
}

/// One live connection on the counter. Dropping it releases the slot, so the
/// decrement runs exactly once on every exit path, panics included.
struct ActiveConnection {
    counter: Arc<AtomicUsize>,
    count: usize,
}

impl ActiveConnection {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Self {
            counter: Arc::clone(counter),
            count,
        }
    }

    /// Live connections right after this one was counted.
    fn count(&self) -> usize {
        self.count
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
