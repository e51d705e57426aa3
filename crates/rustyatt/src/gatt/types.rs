//! Common types for GATT operations
//!
//! This module defines the records produced by GATT discovery.

use crate::uuid::Uuid;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Characteristic properties as defined in the Bluetooth specification
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CharacteristicProperties: u8 {
        const BROADCAST = 0x01;
        const READ = 0x02;
        const WRITE_WITHOUT_RESPONSE = 0x04;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
        const AUTHENTICATED_SIGNED_WRITES = 0x40;
        const EXTENDED_PROPERTIES = 0x80;
    }
}

const PROPERTY_NAMES: [(CharacteristicProperties, &str); 8] = [
    (CharacteristicProperties::BROADCAST, "Broadcast"),
    (CharacteristicProperties::READ, "Read"),
    (CharacteristicProperties::WRITE_WITHOUT_RESPONSE, "WriteWithoutResponse"),
    (CharacteristicProperties::WRITE, "Write"),
    (CharacteristicProperties::NOTIFY, "Notify"),
    (CharacteristicProperties::INDICATE, "Indicate"),
    (
        CharacteristicProperties::AUTHENTICATED_SIGNED_WRITES,
        "AuthenticatedSignedWrites",
    ),
    (CharacteristicProperties::EXTENDED_PROPERTIES, "ExtendedProperties"),
];

impl CharacteristicProperties {
    pub fn can_read(&self) -> bool {
        self.contains(Self::READ)
    }

    pub fn can_write(&self) -> bool {
        self.contains(Self::WRITE)
    }

    pub fn can_write_without_response(&self) -> bool {
        self.contains(Self::WRITE_WITHOUT_RESPONSE)
    }

    pub fn can_notify(&self) -> bool {
        self.contains(Self::NOTIFY)
    }

    pub fn can_indicate(&self) -> bool {
        self.contains(Self::INDICATE)
    }
}

/// Space separated property names, lowest bit first
impl fmt::Display for CharacteristicProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in PROPERTY_NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A GATT service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Service UUID
    pub uuid: Uuid,
    /// Start handle for this service
    pub start_handle: u16,
    /// End handle for this service
    pub end_handle: u16,
}

impl Service {
    /// Whether `handle` falls inside this service's group
    pub fn contains(&self, handle: u16) -> bool {
        (self.start_handle..=self.end_handle).contains(&handle)
    }
}

/// A GATT characteristic, decoded from its declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Characteristic {
    /// Handle of the characteristic value (not of the declaration)
    pub handle: u16,
    /// Characteristic properties
    pub flags: CharacteristicProperties,
    /// Characteristic UUID
    pub uuid: Uuid,
}
