//! KeyV CLI Client
//!
//! Command-line interface for interacting with a KeyV server.

use std::process;

use clap::{Parser, Subcommand};
use keyv::network::Client;

/// KeyV CLI
#[derive(Parser, Debug)]
#[command(name = "keyv-cli")]
#[command(about = "CLI for the KeyV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Ping the server
    Ping,
}

fn run(args: Args) -> keyv::Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Get { key } => match client.get(&key)? {
            Some(value) => println!("{}", value),
            None => {
                eprintln!("(not found)");
                process::exit(2);
            }
        },
        Commands::Set { key, value } => {
            client.put(&key, &value)?;
            println!("OK");
        }
        Commands::Del { key } => {
            client.delete(&key)?;
            println!("OK");
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
