//! Error types for the rustyatt library
//!
//! Transport-level failures live here; protocol failures are in [`crate::att::AttError`].

use thiserror::Error;

/// Errors raised by the channel carrying ATT PDUs
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to open L2CAP socket: {0}")]
    SocketError(#[from] std::io::Error),

    #[error("Failed to bind to local adapter: {0}")]
    BindError(std::io::Error),

    #[error("Failed to connect to remote device: {0}")]
    ConnectError(std::io::Error),

    #[error("Failed to set socket option: {0}")]
    OptionError(std::io::Error),

    #[error("Failed to send PDU: {0}")]
    SendError(std::io::Error),

    #[error("Failed to receive PDU: {0}")]
    ReceiveError(std::io::Error),

    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Connection closed by remote device")]
    Disconnected,
}
