//! Command definitions
//!
//! Represents requests from clients.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = 0x01,
    Put = 0x02,
    Delete = 0x03,
    Ping = 0x04,
}

impl CommandType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandType::Get),
            0x02 => Some(CommandType::Put),
            0x03 => Some(CommandType::Delete),
            0x04 => Some(CommandType::Ping),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key
    Get { key: String },

    /// Put a key-value pair
    Put { key: String, value: String },

    /// Delete a key
    Delete { key: String },

    /// Health check
    Ping,
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Put { .. } => CommandType::Put,
            Command::Delete { .. } => CommandType::Delete,
            Command::Ping => CommandType::Ping,
        }
    }

    /// The key this command targets, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Command::Get { key } | Command::Put { key, .. } | Command::Delete { key } => {
                Some(key.as_str())
            }
            Command::Ping => None,
        }
    }
}
