//! Attribute Protocol (ATT) implementation
//!
//! This module provides the client side of ATT: the request encoders, zero-copy response
//! views, and the paged discovery engine that walks the whole attribute handle space.

pub mod client;
pub mod constants;
pub mod discovery;
pub mod dump;
pub mod error;
pub mod pdu;
pub mod transport;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export the public API
pub use self::client::AttClient;
pub use self::constants::*;
pub use self::discovery::{
    discover, Discovery, DiscoveryWindow, FindInformation, Procedure, ReadByGroupType, ReadByType,
};
pub use self::error::{AttError, AttErrorCode, AttResult};
pub use self::pdu::{
    ErrorResponse, FindInformationResponse, Pdu, ReadByGroupTypeResponse, ReadByTypeResponse,
    Response,
};
pub use self::transport::Transport;
pub use self::types::*;
