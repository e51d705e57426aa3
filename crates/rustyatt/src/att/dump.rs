//! Human-readable rendering of ATT PDUs for logs
use super::constants::*;
use super::pdu::Response;
use crate::uuid::Uuid;
use std::fmt::Write;

/// Name of an ATT opcode
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        ATT_ERROR_RSP => "Error Response",
        ATT_EXCHANGE_MTU_REQ => "Exchange MTU Request",
        ATT_EXCHANGE_MTU_RSP => "Exchange MTU Response",
        ATT_FIND_INFO_REQ => "Find Information Request",
        ATT_FIND_INFO_RSP => "Find Information Response",
        ATT_FIND_BY_TYPE_VALUE_REQ => "Find By Type Value Request",
        ATT_FIND_BY_TYPE_VALUE_RSP => "Find By Type Value Response",
        ATT_READ_BY_TYPE_REQ => "Read By Type Request",
        ATT_READ_BY_TYPE_RSP => "Read By Type Response",
        ATT_READ_REQ => "Read Request",
        ATT_READ_RSP => "Read Response",
        ATT_READ_BLOB_REQ => "Read Blob Request",
        ATT_READ_BLOB_RSP => "Read Blob Response",
        ATT_READ_MULTIPLE_REQ => "Read Multiple Request",
        ATT_READ_MULTIPLE_RSP => "Read Multiple Response",
        ATT_READ_BY_GROUP_TYPE_REQ => "Read By Group Type Request",
        ATT_READ_BY_GROUP_TYPE_RSP => "Read By Group Type Response",
        ATT_WRITE_REQ => "Write Request",
        ATT_WRITE_RSP => "Write Response",
        ATT_PREPARE_WRITE_REQ => "Prepare Write Request",
        ATT_PREPARE_WRITE_RSP => "Prepare Write Response",
        ATT_EXECUTE_WRITE_REQ => "Execute Write Request",
        ATT_EXECUTE_WRITE_RSP => "Execute Write Response",
        ATT_HANDLE_VALUE_NTF => "Handle Value Notification",
        ATT_HANDLE_VALUE_IND => "Handle Value Indication",
        ATT_HANDLE_VALUE_CONF => "Handle Value Confirmation",
        ATT_WRITE_CMD => "Write Command",
        ATT_SIGNED_WRITE_CMD => "Signed Write Command",
        _ => "Unknown",
    }
}

/// Name of an ATT error code
pub fn error_name(code: u8) -> &'static str {
    match code {
        ATT_ERROR_INVALID_HANDLE => "Invalid Handle",
        ATT_ERROR_READ_NOT_PERMITTED => "Read Not Permitted",
        ATT_ERROR_WRITE_NOT_PERMITTED => "Write Not Permitted",
        ATT_ERROR_INVALID_PDU => "Invalid PDU",
        ATT_ERROR_INSUFFICIENT_AUTHENTICATION => "Insufficient Authentication",
        ATT_ERROR_REQUEST_NOT_SUPPORTED => "Request Not Supported",
        ATT_ERROR_INVALID_OFFSET => "Invalid Offset",
        ATT_ERROR_INSUFFICIENT_AUTHORIZATION => "Insufficient Authorization",
        ATT_ERROR_PREPARE_QUEUE_FULL => "Prepare Queue Full",
        ATT_ERROR_ATTRIBUTE_NOT_FOUND => "Attribute Not Found",
        ATT_ERROR_ATTRIBUTE_NOT_LONG => "Attribute Not Long",
        ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE => "Insufficient Encryption Key Size",
        ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => "Invalid Attribute Value Length",
        ATT_ERROR_UNLIKELY => "Unlikely Error",
        ATT_ERROR_INSUFFICIENT_ENCRYPTION => "Insufficient Encryption",
        ATT_ERROR_UNSUPPORTED_GROUP_TYPE => "Unsupported Group Type",
        ATT_ERROR_INSUFFICIENT_RESOURCES => "Insufficient Resources",
        ATT_ERROR_DATABASE_OUT_OF_SYNC => "Database Out Of Sync",
        ATT_ERROR_VALUE_NOT_ALLOWED => "Value Not Allowed",
        ATT_ERROR_APPLICATION_ERROR_START..=ATT_ERROR_APPLICATION_ERROR_END => "Application Error",
        ATT_ERROR_COMMON_PROFILE_ERROR_START..=ATT_ERROR_COMMON_PROFILE_ERROR_END => {
            "Common Profile Error"
        }
        _ => "Reserved",
    }
}

/// Name of a GATT declaration type, `None` for any other attribute type
pub fn attribute_type_name(uuid: &Uuid) -> Option<&'static str> {
    match uuid.as_u16()? {
        PRIMARY_SERVICE_UUID => Some("Primary Service"),
        SECONDARY_SERVICE_UUID => Some("Secondary Service"),
        INCLUDE_UUID => Some("Include"),
        CHARACTERISTIC_UUID => Some("Characteristic"),
        _ => None,
    }
}

/// Printable rendering of raw bytes, escaping anything outside ASCII 32..=126
pub fn printable(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for &b in data {
        if (32..=126).contains(&b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\x{:02x}", b);
        }
    }
    out
}

/// Multi-line description of a PDU: hex, printable bytes, opcode and decoded elements
pub fn describe(data: &[u8]) -> String {
    let mut out = String::new();
    let _ = write!(out, "[{}] \"{}\"", hex::encode(data), printable(data));

    let response = match Response::decode(data) {
        Ok(response) => response,
        Err(e) => {
            let _ = write!(out, " <{}>", e);
            return out;
        }
    };

    let opcode = response.opcode();
    let _ = write!(out, "\n  type: 0x{:02x} {}", opcode, opcode_name(opcode));

    match response {
        Response::Error(err) => {
            let _ = write!(
                out,
                "\n  {} in response to {} on handle 0x{:04x}",
                error_name(err.error_code),
                opcode_name(err.request_opcode),
                err.handle
            );
        }
        Response::ReadByType(rsp) => {
            let _ = write!(
                out,
                "\n  elements = {}, value size = {}",
                rsp.num_elements(),
                rsp.value_len()
            );
            for (handle, value) in rsp.iter() {
                if value.len() == 2 {
                    let _ = write!(out, "\n  0x{:04x} {:02x}{:02x}", handle, value[1], value[0]);
                } else {
                    let _ = write!(out, "\n  0x{:04x} -->{}<--", handle, printable(value));
                }
            }
        }
        Response::ReadByGroupType(rsp) => {
            let _ = write!(out, "\n  elements = {}", rsp.num_elements());
            for i in 0..rsp.num_elements() {
                let _ = write!(
                    out,
                    "\n  [0x{:04x}, 0x{:04x}] {}",
                    rsp.start_handle(i),
                    rsp.end_handle(i),
                    rsp.uuid(i)
                );
            }
        }
        Response::FindInformation(rsp) => {
            let _ = write!(out, "\n  elements = {}", rsp.num_elements());
            for i in 0..rsp.num_elements() {
                let uuid = rsp.uuid(i);
                let _ = write!(out, "\n  0x{:04x} {}", rsp.handle(i), uuid);
                if let Some(name) = attribute_type_name(&uuid) {
                    let _ = write!(out, " ({})", name);
                }
            }
        }
        Response::Other(_) => {}
    }

    out
}
