use std::path::PathBuf;
use thiserror::Error;

use crate::core_reference::ReferenceError;

/// Everything that can abort a retrieval. Every variant is terminal; there is
/// no retry path.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to resolve hostname: {0}")]
    Resolution(String),

    #[error("Could not connect to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        source: std::io::Error,
    },

    #[error("Invalid file reference: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Login failed: {0}")]
    Authentication(String),

    #[error("Failed to enter passive mode: {0}")]
    PassiveMode(String),

    #[error("Error parsing PASV response: {0}")]
    PassiveReplyParse(String),

    #[error("Error sending command {verb}: {source}")]
    Transmission {
        verb: String,
        source: std::io::Error,
    },

    #[error("Error writing to file {path:?}: {source}")]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("File transfer not confirmed by server: {0}")]
    IncompleteTransfer(String),
}
