//! Error handling for the ATT protocol
use super::constants::*;
use crate::error::TransportError;
use std::fmt;
use thiserror::Error;

/// ATT error codes carried by an Error Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttErrorCode {
    /// Invalid handle
    InvalidHandle,
    /// Read not permitted
    ReadNotPermitted,
    /// Write not permitted
    WriteNotPermitted,
    /// Invalid PDU
    InvalidPdu,
    /// Insufficient authentication
    InsufficientAuthentication,
    /// Request not supported
    RequestNotSupported,
    /// Invalid offset
    InvalidOffset,
    /// Insufficient authorization
    InsufficientAuthorization,
    /// Prepare queue full
    PrepareQueueFull,
    /// Attribute not found
    AttributeNotFound,
    /// Attribute not long
    AttributeNotLong,
    /// Insufficient encryption key size
    InsufficientEncryptionKeySize,
    /// Invalid attribute value length
    InvalidAttributeValueLength,
    /// Unlikely error
    Unlikely,
    /// Insufficient encryption
    InsufficientEncryption,
    /// Unsupported group type
    UnsupportedGroupType,
    /// Insufficient resources
    InsufficientResources,
    /// Database out of sync
    DatabaseOutOfSync,
    /// Value not allowed
    ValueNotAllowed,
    /// Application error
    ApplicationError(u8),
    /// Common profile error
    CommonProfileError(u8),
    /// Reserved or unknown error code
    Unknown(u8),
}

impl From<u8> for AttErrorCode {
    fn from(code: u8) -> Self {
        match code {
            ATT_ERROR_INVALID_HANDLE => AttErrorCode::InvalidHandle,
            ATT_ERROR_READ_NOT_PERMITTED => AttErrorCode::ReadNotPermitted,
            ATT_ERROR_WRITE_NOT_PERMITTED => AttErrorCode::WriteNotPermitted,
            ATT_ERROR_INVALID_PDU => AttErrorCode::InvalidPdu,
            ATT_ERROR_INSUFFICIENT_AUTHENTICATION => AttErrorCode::InsufficientAuthentication,
            ATT_ERROR_REQUEST_NOT_SUPPORTED => AttErrorCode::RequestNotSupported,
            ATT_ERROR_INVALID_OFFSET => AttErrorCode::InvalidOffset,
            ATT_ERROR_INSUFFICIENT_AUTHORIZATION => AttErrorCode::InsufficientAuthorization,
            ATT_ERROR_PREPARE_QUEUE_FULL => AttErrorCode::PrepareQueueFull,
            ATT_ERROR_ATTRIBUTE_NOT_FOUND => AttErrorCode::AttributeNotFound,
            ATT_ERROR_ATTRIBUTE_NOT_LONG => AttErrorCode::AttributeNotLong,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE => {
                AttErrorCode::InsufficientEncryptionKeySize
            }
            ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => AttErrorCode::InvalidAttributeValueLength,
            ATT_ERROR_UNLIKELY => AttErrorCode::Unlikely,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION => AttErrorCode::InsufficientEncryption,
            ATT_ERROR_UNSUPPORTED_GROUP_TYPE => AttErrorCode::UnsupportedGroupType,
            ATT_ERROR_INSUFFICIENT_RESOURCES => AttErrorCode::InsufficientResources,
            ATT_ERROR_DATABASE_OUT_OF_SYNC => AttErrorCode::DatabaseOutOfSync,
            ATT_ERROR_VALUE_NOT_ALLOWED => AttErrorCode::ValueNotAllowed,
            ATT_ERROR_APPLICATION_ERROR_START..=ATT_ERROR_APPLICATION_ERROR_END => {
                AttErrorCode::ApplicationError(code)
            }
            ATT_ERROR_COMMON_PROFILE_ERROR_START..=ATT_ERROR_COMMON_PROFILE_ERROR_END => {
                AttErrorCode::CommonProfileError(code)
            }
            _ => AttErrorCode::Unknown(code),
        }
    }
}

impl From<AttErrorCode> for u8 {
    fn from(code: AttErrorCode) -> u8 {
        match code {
            AttErrorCode::InvalidHandle => ATT_ERROR_INVALID_HANDLE,
            AttErrorCode::ReadNotPermitted => ATT_ERROR_READ_NOT_PERMITTED,
            AttErrorCode::WriteNotPermitted => ATT_ERROR_WRITE_NOT_PERMITTED,
            AttErrorCode::InvalidPdu => ATT_ERROR_INVALID_PDU,
            AttErrorCode::InsufficientAuthentication => ATT_ERROR_INSUFFICIENT_AUTHENTICATION,
            AttErrorCode::RequestNotSupported => ATT_ERROR_REQUEST_NOT_SUPPORTED,
            AttErrorCode::InvalidOffset => ATT_ERROR_INVALID_OFFSET,
            AttErrorCode::InsufficientAuthorization => ATT_ERROR_INSUFFICIENT_AUTHORIZATION,
            AttErrorCode::PrepareQueueFull => ATT_ERROR_PREPARE_QUEUE_FULL,
            AttErrorCode::AttributeNotFound => ATT_ERROR_ATTRIBUTE_NOT_FOUND,
            AttErrorCode::AttributeNotLong => ATT_ERROR_ATTRIBUTE_NOT_LONG,
            AttErrorCode::InsufficientEncryptionKeySize => {
                ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE
            }
            AttErrorCode::InvalidAttributeValueLength => ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH,
            AttErrorCode::Unlikely => ATT_ERROR_UNLIKELY,
            AttErrorCode::InsufficientEncryption => ATT_ERROR_INSUFFICIENT_ENCRYPTION,
            AttErrorCode::UnsupportedGroupType => ATT_ERROR_UNSUPPORTED_GROUP_TYPE,
            AttErrorCode::InsufficientResources => ATT_ERROR_INSUFFICIENT_RESOURCES,
            AttErrorCode::DatabaseOutOfSync => ATT_ERROR_DATABASE_OUT_OF_SYNC,
            AttErrorCode::ValueNotAllowed => ATT_ERROR_VALUE_NOT_ALLOWED,
            AttErrorCode::ApplicationError(code) => code,
            AttErrorCode::CommonProfileError(code) => code,
            AttErrorCode::Unknown(code) => code,
        }
    }
}

impl fmt::Display for AttErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code: u8 = (*self).into();
        write!(f, "{} (0x{:02x})", super::dump::error_name(code), code)
    }
}

/// Failure of an ATT exchange or of a whole discovery call
#[derive(Debug, Error)]
pub enum AttError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Malformed PDU: {0}")]
    MalformedPdu(&'static str),

    #[error("ATT error {code} in response to opcode 0x{request_opcode:02x} on handle 0x{handle:04x}")]
    Protocol {
        request_opcode: u8,
        handle: u16,
        code: AttErrorCode,
    },

    #[error("Error response for opcode 0x{actual:02x} while waiting on opcode 0x{expected:02x}")]
    UnexpectedErrorOpcode { expected: u8, actual: u8 },

    #[error("Unexpected response opcode 0x{actual:02x}, expected 0x{expected:02x}")]
    UnexpectedResponse { expected: u8, actual: u8 },

    #[error("PDU needs {needed} bytes but only {available} are available")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Invalid characteristic declaration value size: {0}")]
    InvalidCharacteristic(usize),

    #[error("Page ends at handle 0x{last:04x}, before window start 0x{start:04x}")]
    WindowRegression { start: u16, last: u16 },

    #[error("Invalid handle range 0x{start:04x}-0x{end:04x}")]
    InvalidRange { start: u16, end: u16 },
}

impl AttError {
    /// The ATT error code carried by a protocol error, if any
    pub fn error_code(&self) -> Option<AttErrorCode> {
        match self {
            AttError::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the request/response sequence on the connection can no longer be trusted
    pub fn is_desynchronized(&self) -> bool {
        matches!(
            self,
            AttError::UnexpectedErrorOpcode { .. } | AttError::UnexpectedResponse { .. }
        )
    }

    /// Whether a received PDU could not be decoded
    ///
    /// A characteristic declaration with a value size other than 5 or 19 counts as malformed.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            AttError::MalformedPdu(_) | AttError::InvalidCharacteristic(_)
        )
    }
}

/// ATT Result type
pub type AttResult<T> = Result<T, AttError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(AttErrorCode::from(0x0A), AttErrorCode::AttributeNotFound);
        assert_eq!(AttErrorCode::from(0x05), AttErrorCode::InsufficientAuthentication);
        assert_eq!(AttErrorCode::from(0x85), AttErrorCode::ApplicationError(0x85));
        assert_eq!(AttErrorCode::from(0xFD), AttErrorCode::CommonProfileError(0xFD));
        assert_eq!(AttErrorCode::from(0x50), AttErrorCode::Unknown(0x50));

        for code in [0x01u8, 0x0A, 0x13, 0x85, 0x50, 0xFF] {
            assert_eq!(u8::from(AttErrorCode::from(code)), code);
        }
    }

    #[test]
    fn test_error_accessors() {
        let err = AttError::Protocol {
            request_opcode: ATT_READ_BY_TYPE_REQ,
            handle: 0x0012,
            code: AttErrorCode::ReadNotPermitted,
        };
        assert_eq!(err.error_code(), Some(AttErrorCode::ReadNotPermitted));
        assert!(!err.is_desynchronized());
        assert!(err.to_string().contains("0x0012"));

        let err = AttError::UnexpectedResponse {
            expected: ATT_READ_BY_TYPE_RSP,
            actual: ATT_READ_RSP,
        };
        assert!(err.is_desynchronized());
        assert!(!err.is_malformed());
        assert_eq!(err.error_code(), None);
    }

    #[test]
    fn test_malformed_family() {
        assert!(AttError::MalformedPdu("empty PDU").is_malformed());
        assert!(AttError::InvalidCharacteristic(7).is_malformed());
        assert!(!AttError::InvalidRange { start: 0, end: 5 }.is_malformed());
        assert!(!AttError::BufferTooSmall {
            needed: 21,
            available: 20
        }
        .is_malformed());
        assert!(!AttError::Transport(TransportError::Disconnected).is_malformed());
    }
}
