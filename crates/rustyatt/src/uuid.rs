//! Bluetooth attribute UUIDs
//!
//! A UUID on the wire is either a 16-bit SIG-assigned short form or a full 128-bit value.
//! The encoded width is decided by the PDU that carries it, so the two forms are kept as
//! distinct variants rather than being normalised onto the base UUID.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width in bytes of a short-form UUID on the wire.
pub const UUID16_LEN: usize = 2;
/// Width in bytes of a full UUID on the wire.
pub const UUID128_LEN: usize = 16;

/// An attribute or service type identifier.
///
/// `Full` holds the bytes in the little-endian order in which they travel on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uuid {
    /// 16-bit SIG-assigned value
    Short(u16),
    /// 128-bit value, little-endian
    Full([u8; 16]),
}

impl Uuid {
    /// Creates a UUID from a 16-bit SIG-assigned value.
    pub const fn from_u16(uuid16: u16) -> Self {
        Uuid::Short(uuid16)
    }

    /// Creates a full UUID from 16 bytes in big-endian (textual) order.
    pub fn from_bytes_be(mut bytes: [u8; 16]) -> Self {
        bytes.reverse();
        Uuid::Full(bytes)
    }

    /// Reads a UUID from its little-endian wire form.
    ///
    /// Accepts slices of length 2 or 16 and returns `None` for anything else.
    pub fn from_le_slice(slice: &[u8]) -> Option<Self> {
        match slice.len() {
            UUID16_LEN => Some(Uuid::Short(u16::from_le_bytes([slice[0], slice[1]]))),
            UUID128_LEN => {
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(slice);
                Some(Uuid::Full(bytes))
            }
            _ => None,
        }
    }

    /// Number of bytes this UUID occupies when encoded.
    pub const fn encoded_len(&self) -> usize {
        match self {
            Uuid::Short(_) => UUID16_LEN,
            Uuid::Full(_) => UUID128_LEN,
        }
    }

    /// Writes the little-endian wire form into `buf`, returning the number of bytes written,
    /// or `None` if `buf` is too short.
    pub fn write_le(&self, buf: &mut [u8]) -> Option<usize> {
        let len = self.encoded_len();
        let dst = buf.get_mut(..len)?;
        match self {
            Uuid::Short(v) => dst.copy_from_slice(&v.to_le_bytes()),
            Uuid::Full(bytes) => dst.copy_from_slice(bytes),
        }
        Some(len)
    }

    /// Returns the 16-bit value if this is a short-form UUID.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Uuid::Short(v) => Some(*v),
            Uuid::Full(_) => None,
        }
    }
}

impl From<u16> for Uuid {
    fn from(uuid16: u16) -> Self {
        Uuid::Short(uuid16)
    }
}

impl From<[u8; 16]> for Uuid {
    /// Assumes bytes are in little-endian order.
    fn from(bytes: [u8; 16]) -> Self {
        Uuid::Full(bytes)
    }
}

impl PartialEq<u16> for Uuid {
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == Some(*other)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uuid::Short(v) => write!(f, "{:04x}", v),
            Uuid::Full(bytes) => {
                let b = bytes;
                write!(
                    f,
                    "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
                    b[15], b[14], b[13], b[12],
                    b[11], b[10],
                    b[9], b[8],
                    b[7], b[6],
                    b[5], b[4], b[3], b[2], b[1], b[0]
                )
            }
        }
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uuid::Short(v) => write!(f, "Uuid(0x{:04X})", v),
            Uuid::Full(_) => write!(f, "Uuid({})", self),
        }
    }
}

/// Failure to parse a UUID from text
#[derive(Debug, Error)]
pub enum UuidParseError {
    #[error("UUID must have 4 or 32 hex digits, got {0}")]
    InvalidLength(usize),

    #[error("Invalid character in UUID: {0:?}")]
    InvalidCharacter(char),

    #[error("Invalid hex in UUID: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    /// Parses `"180a"`, `"0x180A"` or a 128-bit UUID with or without hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        let mut cleaned = String::with_capacity(32);
        for c in s.chars() {
            match c {
                '-' => {}
                c if c.is_ascii_hexdigit() => cleaned.push(c),
                c => return Err(UuidParseError::InvalidCharacter(c)),
            }
        }

        match cleaned.len() {
            4 => {
                let mut be = [0u8; 2];
                hex::decode_to_slice(&cleaned, &mut be)?;
                Ok(Uuid::Short(u16::from_be_bytes(be)))
            }
            32 => {
                let mut be = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut be)?;
                Ok(Uuid::from_bytes_be(be))
            }
            n => Err(UuidParseError::InvalidLength(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NORDIC_UART: &str = "6e400001-b5a3-f393-e0a9-e50e24dcca9e";

    #[test]
    fn test_short_uuid_formatting() {
        let uuid = Uuid::from_u16(0x2803);
        assert_eq!(uuid.to_string(), "2803");
        assert_eq!(format!("{:?}", uuid), "Uuid(0x2803)");
        assert_eq!(uuid.encoded_len(), 2);
        assert_eq!(uuid, 0x2803u16);
    }

    #[test]
    fn test_full_uuid_text_order() {
        let uuid: Uuid = NORDIC_UART.parse().unwrap();
        assert_eq!(uuid.to_string(), NORDIC_UART);
        assert_eq!(uuid.encoded_len(), 16);

        // Wire order is little-endian, so the last text byte comes first
        match uuid {
            Uuid::Full(bytes) => {
                assert_eq!(bytes[0], 0x9e);
                assert_eq!(bytes[15], 0x6e);
            }
            Uuid::Short(_) => panic!("expected a full UUID"),
        }
    }

    #[test]
    fn test_short_and_full_are_distinct() {
        let short = Uuid::from_u16(0x1800);
        let full: Uuid = "00001800-0000-1000-8000-00805f9b34fb".parse().unwrap();
        assert_ne!(short, full);
        assert_eq!(full.as_u16(), None);
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!("180a".parse::<Uuid>().unwrap(), Uuid::Short(0x180A));
        assert_eq!("0x2800".parse::<Uuid>().unwrap(), Uuid::Short(0x2800));
        assert!(matches!(
            "123".parse::<Uuid>(),
            Err(UuidParseError::InvalidLength(3))
        ));
        assert!(matches!(
            "12g4".parse::<Uuid>(),
            Err(UuidParseError::InvalidCharacter('g'))
        ));
    }

    #[test]
    fn test_wire_form() {
        let mut buf = [0u8; 16];
        assert_eq!(Uuid::Short(0x2803).write_le(&mut buf), Some(2));
        assert_eq!(&buf[..2], &[0x03, 0x28]);
        assert_eq!(Uuid::from_le_slice(&buf[..2]), Some(Uuid::Short(0x2803)));

        let full: Uuid = NORDIC_UART.parse().unwrap();
        assert_eq!(full.write_le(&mut buf[..15]), None);
        assert_eq!(full.write_le(&mut buf), Some(16));
        assert_eq!(Uuid::from_le_slice(&buf), Some(full));
        assert_eq!(Uuid::from_le_slice(&buf[..3]), None);
    }
}
