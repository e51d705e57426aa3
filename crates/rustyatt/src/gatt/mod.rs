//! GATT (Generic Attribute Profile) implementation
//!
//! This module provides discovery of GATT services and characteristics on Bluetooth LE
//! devices, built on the paged ATT discovery procedures.

pub mod characteristic;
pub mod client;
pub mod types;


pub use characteristic::{CharacteristicDeclarations, CharacteristicDiscovery};
pub use client::GattClient;
pub use types::{Characteristic, CharacteristicProperties, Service};
