//! Network Module
//!
//! TCP front end for the engine.
//!
//! ## Architecture
//! - Single acceptor thread polling a shutdown flag
//! - One thread per connection, capped by `max_connections`
//! - Commands routed through Engine

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::Connection;
pub use server::{Server, ShutdownHandle};
