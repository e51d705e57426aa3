//! L2CAP transport for ATT
//!
//! This module opens the LE ATT fixed channel (CID 4) to a remote device through the
//! kernel's L2CAP sockets and exposes it as an ATT [`Transport`](crate::att::Transport).

pub mod socket;
pub mod types;

// Re-export the public API
pub use self::socket::L2capSocket;
pub use self::types::*;
