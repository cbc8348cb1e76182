//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{write_response, Response};

use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// TCP server for KeyV
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    /// Connections currently being served
    active: Arc<AtomicUsize>,
}

/// Stops a running [`Server`] from another thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Decrements the active connection count when a connection thread ends
struct ActiveConnection(Arc<AtomicUsize>);

impl ActiveConnection {
    fn new(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the accept loop to stop
    ///
    /// Connections already being served run until their client leaves.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Accept connections until shut down (blocking)
    pub fn run(&self) -> Result<()> {
        tracing::info!(addr = %self.local_addr()?, "listening");

        while !self.shutdown.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => self.dispatch(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    // Usually transient (e.g. out of file descriptors)
                    tracing::warn!(error = %e, "accept failed");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("server stopped accepting connections");
        Ok(())
    }

    fn dispatch(&self, mut stream: TcpStream, peer: SocketAddr) {
        if self.active_connections() >= self.config.max_connections {
            tracing::warn!(%peer, max = self.config.max_connections, "connection limit reached");
            let _ = write_response(&mut stream, &Response::error("too many connections"));
            return;
        }

        // Accepted sockets inherit non-blocking mode on some platforms
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!(%peer, error = %e, "cannot configure connection");
            return;
        }

        let guard = ActiveConnection::new(&self.active);
        let engine = Arc::clone(&self.engine);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let spawned = thread::Builder::new()
            .name(format!("keyv-conn-{}", peer))
            .spawn(move || {
                let _guard = guard;
                let mut connection = match Connection::new(stream, engine) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!(%peer, error = %e, "cannot set up connection");
                        return;
                    }
                };
                if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
                    tracing::warn!(%peer, error = %e, "cannot set connection timeouts");
                    return;
                }
                if let Err(e) = connection.handle() {
                    tracing::debug!(%peer, error = %e, "connection closed with error");
                }
            });

        if let Err(e) = spawned {
            tracing::error!(%peer, error = %e, "cannot spawn connection thread");
        }
    }
}
