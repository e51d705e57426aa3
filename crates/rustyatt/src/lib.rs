//! RustyATT - A Rust library for Bluetooth LE attribute discovery
//!
//! This library implements the client side of the Attribute Protocol (ATT) and the GATT
//! discovery built on it: request encoding, zero-copy response decoding, and paged discovery
//! of every attribute, service and characteristic of a remote device. On Linux it connects
//! over the kernel's L2CAP sockets.

pub mod att;
pub mod error;
pub mod gatt;
pub mod l2cap;
pub mod uuid;

// Re-export common types for convenience
pub use att::{AttClient, AttError, AttErrorCode, AttResult, Transport};
pub use error::TransportError;
pub use gatt::{Characteristic, CharacteristicProperties, GattClient, Service};
pub use l2cap::{AddressType, BdAddr, L2capConfig, L2capSocket};
pub use uuid::{Uuid, UuidParseError};
