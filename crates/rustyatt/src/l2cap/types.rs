//! Addresses and configuration for L2CAP connections

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Error parsing a textual Bluetooth device address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddrParseError {
    #[error("Expected 6 colon separated octets, got {0}")]
    InvalidLength(usize),

    #[error("Invalid octet {0:?}")]
    InvalidOctet(String),

    #[error("Unknown address type {0:?}, expected \"public\" or \"random\"")]
    InvalidAddressType(String),
}

/// Bluetooth device address, stored in the little-endian order the kernel uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    /// Any local adapter
    pub const ANY: BdAddr = BdAddr { bytes: [0; 6] };
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

/// Parses `XX:XX:XX:XX:XX:XX`, most significant octet first
impl FromStr for BdAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets: Vec<&str> = s.split(':').collect();
        if octets.len() != 6 {
            return Err(AddrParseError::InvalidLength(octets.len()));
        }

        let mut bytes = [0u8; 6];
        for (i, octet) in octets.iter().enumerate() {
            if octet.len() != 2 {
                return Err(AddrParseError::InvalidOctet(octet.to_string()));
            }
            bytes[5 - i] = u8::from_str_radix(octet, 16)
                .map_err(|_| AddrParseError::InvalidOctet(octet.to_string()))?;
        }
        Ok(Self { bytes })
    }
}

/// LE address type of the remote device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressType {
    #[default]
    Public,
    Random,
}

/// `BDADDR_LE_PUBLIC`
pub const BDADDR_LE_PUBLIC: u8 = 0x01;
/// `BDADDR_LE_RANDOM`
pub const BDADDR_LE_RANDOM: u8 = 0x02;

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Public => BDADDR_LE_PUBLIC,
            AddressType::Random => BDADDR_LE_RANDOM,
        }
    }
}

impl FromStr for AddressType {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(AddressType::Public),
            "random" => Ok(AddressType::Random),
            _ => Err(AddrParseError::InvalidAddressType(s.to_string())),
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressType::Public => f.write_str("public"),
            AddressType::Random => f.write_str("random"),
        }
    }
}

/// Settings for opening an ATT channel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct L2capConfig {
    /// Local adapter to bind, [`BdAddr::ANY`] for the first available one
    pub source: BdAddr,
    /// Address type of the remote device
    pub address_type: AddressType,
    /// Fail a receive that blocks longer than this
    pub receive_timeout: Option<Duration>,
    /// Fail a send that blocks longer than this
    pub send_timeout: Option<Duration>,
}
