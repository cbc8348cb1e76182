//! TCP client
//!
//! Blocking client speaking the keyv wire protocol.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{KeyvError, Result};
use crate::protocol::{read_response, write_command, Command, Response, Status};

/// A connection to a keyv server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one command and wait for its response
    pub fn call(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    /// Fetch a value; `None` when the key is absent
    pub fn get(&mut self, key: &str) -> Result<Option<String>> {
        let response = self.call(&Command::Get {
            key: key.to_string(),
        })?;
        match response.status {
            Status::Ok => {
                let payload = response.payload.unwrap_or_default();
                String::from_utf8(payload)
                    .map(Some)
                    .map_err(|_| KeyvError::Protocol("value is not valid UTF-8".to_string()))
            }
            Status::NotFound => Ok(None),
            Status::Error => Err(remote_error(&response)),
        }
    }

    pub fn put(&mut self, key: &str, value: &str) -> Result<()> {
        let response = self.call(&Command::Put {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        expect_ok(&response)
    }

    pub fn delete(&mut self, key: &str) -> Result<()> {
        let response = self.call(&Command::Delete {
            key: key.to_string(),
        })?;
        expect_ok(&response)
    }

    pub fn ping(&mut self) -> Result<()> {
        expect_ok(&self.call(&Command::Ping)?)
    }
}

fn remote_error(response: &Response) -> KeyvError {
    KeyvError::Remote(response.payload_text().unwrap_or_default())
}

fn expect_ok(response: &Response) -> Result<()> {
    match response.status {
        Status::Ok => Ok(()),
        Status::NotFound => Err(KeyvError::NotFound),
        Status::Error => Err(remote_error(response)),
    }
}
