//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Device {address} not reachable")]
    Unreachable { address: String },

    #[error("Device {address} is not paired")]
    NotPaired { address: String },

    #[error("Invalid Bluetooth address: {0}")]
    InvalidAddress(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection closed by remote")]
    Closed,

    #[error("Read timeout")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
