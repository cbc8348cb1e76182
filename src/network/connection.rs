//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{self, BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{KeyvError, Result};
use crate::protocol::{read_command, write_response, Command, Response};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,
}

/// Errors that just mean the client went away or went quiet
fn is_disconnect(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            // Read timeouts: WouldBlock on unix, TimedOut on Windows
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            engine,
            peer_addr,
        })
    }

    /// Configure connection timeouts; 0 leaves a direction without one
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!(peer = %self.peer_addr, "connection established");

        loop {
            let command = match read_command(&mut self.reader) {
                Ok(command) => command,
                Err(KeyvError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!(peer = %self.peer_addr, reason = ?e.kind(), "client disconnected");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(peer = %self.peer_addr, error = %e, "bad request");
                    let _ = self.send_response(Response::error(&e.to_string()));
                    return Err(e);
                }
            };

            tracing::trace!(peer = %self.peer_addr, ?command, "received command");

            let response = self.execute_command(command);

            if let Err(e) = self.send_response(response) {
                if let KeyvError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            peer = %self.peer_addr,
                            "client disconnected before response could be sent"
                        );
                        return Ok(());
                    }
                }
                tracing::warn!(peer = %self.peer_addr, error = %e, "write failed");
                return Err(e);
            }
        }
    }

    /// Execute a command and return a response
    fn execute_command(&self, command: Command) -> Response {
        match self.engine.execute(command) {
            Ok(Some(value)) => Response::ok(Some(value.into_bytes())),
            Ok(None) => Response::ok(None),
            Err(KeyvError::NotFound) => Response::not_found(),
            Err(e) => Response::error(&e.to_string()),
        }
    }

    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }
}
