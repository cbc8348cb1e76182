//! KeyV Server Binary
//!
//! Recovers the store from its transaction log and serves it over TCP.

use std::process;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use keyv::network::Server;
use keyv::{Config, Engine, LogSyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// KeyV Server
#[derive(Parser, Debug)]
#[command(name = "keyv-server")]
#[command(about = "Durable key-value store backed by a transaction log")]
#[command(version)]
struct Args {
    /// Data directory (holds transaction.log)
    #[arg(short, long, default_value = "./keyv_data")]
    data_dir: String,

    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Pending log events before writers block
    #[arg(short, long, default_value = "16")]
    queue_capacity: usize,

    /// fsync the log every N events (0 = leave it to the OS)
    #[arg(short, long, default_value = "16")]
    sync_every: usize,
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,keyv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let listen_addr = format!("{}:{}", args.host, args.port);

    tracing::info!("KeyV Server v{}", keyv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", listen_addr);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(listen_addr)
        .max_connections(args.max_connections)
        .queue_capacity(args.queue_capacity)
        .sync_strategy(LogSyncStrategy::from_count(args.sync_every))
        .build();

    let engine = match Engine::open(config.clone()) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            process::exit(1);
        }
    };

    tracing::info!(
        recovered = engine.recovery().events_replayed,
        keys = engine.store().len(),
        "Engine initialized"
    );

    // A log fault means new writes are no longer durable; stop serving
    let errors = engine.errors();
    thread::spawn(move || {
        if let Ok(e) = errors.recv() {
            tracing::error!("Transaction log failed, shutting down: {}", e);
            process::exit(1);
        }
    });

    let server = match Server::bind(config, Arc::clone(&engine)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        process::exit(1);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close transaction log: {}", e);
        process::exit(1);
    }
    tracing::info!("Server stopped");
}
