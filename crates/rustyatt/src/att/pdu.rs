//! Borrowed views over received ATT PDUs
//!
//! None of these types copy the PDU. They borrow the receive buffer and compute element
//! offsets on demand, so a view cannot outlive the buffer it was decoded from and must be
//! dropped before the next receive overwrites it.
//!
//! Every multi-element response uses a single stride for all of its elements. A view is
//! only constructed after the stride and the total length have been checked, and it always
//! holds at least one element.
use super::constants::*;
use super::error::{AttError, AttErrorCode, AttResult};
use crate::uuid::{Uuid, UUID128_LEN, UUID16_LEN};
use byteorder::{ByteOrder, LittleEndian};
use std::slice::ChunksExact;

/// A received PDU of at least one byte
#[derive(Debug, Clone, Copy)]
pub struct Pdu<'a> {
    data: &'a [u8],
}

impl<'a> Pdu<'a> {
    pub fn new(data: &'a [u8]) -> AttResult<Self> {
        if data.is_empty() {
            return Err(AttError::MalformedPdu("empty PDU"));
        }
        Ok(Self { data })
    }

    pub fn opcode(&self) -> u8 {
        self.data[0]
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    fn expect_opcode(&self, opcode: u8) -> AttResult<()> {
        if self.opcode() != opcode {
            return Err(AttError::UnexpectedResponse {
                expected: opcode,
                actual: self.opcode(),
            });
        }
        Ok(())
    }
}

/// Error Response packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Request opcode in error
    pub request_opcode: u8,
    /// Attribute handle in error
    pub handle: u16,
    /// Raw error code
    pub error_code: u8,
}

impl ErrorResponse {
    pub fn parse(pdu: Pdu<'_>) -> AttResult<Self> {
        pdu.expect_opcode(ATT_ERROR_RSP)?;
        let data = pdu.as_bytes();
        if data.len() < ATT_ERROR_RSP_SIZE {
            return Err(AttError::MalformedPdu("error response shorter than 5 bytes"));
        }

        Ok(Self {
            request_opcode: data[1],
            handle: LittleEndian::read_u16(&data[2..4]),
            error_code: data[4],
        })
    }

    pub fn code(&self) -> AttErrorCode {
        self.error_code.into()
    }

    /// The end-of-range signal of a discovery procedure
    pub fn is_attribute_not_found(&self) -> bool {
        self.error_code == ATT_ERROR_ATTRIBUTE_NOT_FOUND
    }

    /// Converts into the error surfaced to callers
    pub fn into_error(self) -> AttError {
        AttError::Protocol {
            request_opcode: self.request_opcode,
            handle: self.handle,
            code: self.code(),
        }
    }
}

/// Reads a UUID field whose width (2 or 16) was checked when the view was built
pub(crate) fn uuid_field(field: &[u8]) -> Uuid {
    if field.len() == UUID16_LEN {
        Uuid::Short(LittleEndian::read_u16(field))
    } else {
        let mut bytes = [0u8; UUID128_LEN];
        bytes.copy_from_slice(field);
        Uuid::Full(bytes)
    }
}

/// Splits the element list of a `[opcode][byte][elements...]` response into `stride`-sized
/// elements, rejecting a trailing partial element and an empty list.
fn element_list(data: &[u8], stride: usize) -> AttResult<&[u8]> {
    let body = data
        .get(ATT_LIST_RSP_HEADER_SIZE..)
        .ok_or(AttError::MalformedPdu("response shorter than its header"))?;

    if body.len() % stride != 0 {
        return Err(AttError::MalformedPdu("element list is not a multiple of the stride"));
    }
    if body.is_empty() {
        return Err(AttError::MalformedPdu("response carries no elements"));
    }
    Ok(body)
}

/// Read By Type Response packet
///
/// Byte 1 is the length of one element: the 2-byte handle followed by the attribute value.
#[derive(Debug, Clone, Copy)]
pub struct ReadByTypeResponse<'a> {
    body: &'a [u8],
    stride: usize,
}

impl<'a> ReadByTypeResponse<'a> {
    pub fn parse(pdu: Pdu<'a>) -> AttResult<Self> {
        pdu.expect_opcode(ATT_READ_BY_TYPE_RSP)?;
        let data = pdu.as_bytes();
        if data.len() < ATT_LIST_RSP_HEADER_SIZE {
            return Err(AttError::MalformedPdu("read by type response shorter than 2 bytes"));
        }

        let stride = data[1] as usize;
        if stride < 2 {
            return Err(AttError::MalformedPdu("read by type element shorter than a handle"));
        }

        Ok(Self {
            body: element_list(data, stride)?,
            stride,
        })
    }

    /// Length of one element, handle included
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Length of the attribute value in each element
    pub fn value_len(&self) -> usize {
        self.stride - 2
    }

    pub fn num_elements(&self) -> usize {
        self.body.len() / self.stride
    }

    fn element(&self, i: usize) -> &'a [u8] {
        &self.body[i * self.stride..(i + 1) * self.stride]
    }

    pub fn handle(&self, i: usize) -> u16 {
        LittleEndian::read_u16(&self.element(i)[..2])
    }

    pub fn value(&self, i: usize) -> &'a [u8] {
        &self.element(i)[2..]
    }

    /// Handle of the final element
    pub fn last_handle(&self) -> u16 {
        self.handle(self.num_elements() - 1)
    }

    pub fn iter(&self) -> ReadByTypeIter<'a> {
        ReadByTypeIter {
            chunks: self.body.chunks_exact(self.stride),
        }
    }
}

/// Iterator over `(handle, value)` pairs of a Read By Type Response
pub struct ReadByTypeIter<'a> {
    chunks: ChunksExact<'a, u8>,
}

impl<'a> Iterator for ReadByTypeIter<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        Some((LittleEndian::read_u16(&chunk[..2]), &chunk[2..]))
    }
}

/// Read By Group Type Response packet
///
/// Each element is `[start handle][end group handle][uuid]`, with the UUID width implied by
/// the element length in byte 1.
#[derive(Debug, Clone, Copy)]
pub struct ReadByGroupTypeResponse<'a> {
    body: &'a [u8],
    stride: usize,
}

impl<'a> ReadByGroupTypeResponse<'a> {
    pub fn parse(pdu: Pdu<'a>) -> AttResult<Self> {
        pdu.expect_opcode(ATT_READ_BY_GROUP_TYPE_RSP)?;
        let data = pdu.as_bytes();
        if data.len() < ATT_LIST_RSP_HEADER_SIZE {
            return Err(AttError::MalformedPdu("read by group type response shorter than 2 bytes"));
        }

        let stride = data[1] as usize;
        match stride.checked_sub(4) {
            Some(UUID16_LEN) | Some(UUID128_LEN) => {}
            _ => return Err(AttError::MalformedPdu("group element must carry a 2 or 16 byte UUID")),
        }

        Ok(Self {
            body: element_list(data, stride)?,
            stride,
        })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn num_elements(&self) -> usize {
        self.body.len() / self.stride
    }

    fn element(&self, i: usize) -> &'a [u8] {
        &self.body[i * self.stride..(i + 1) * self.stride]
    }

    pub fn start_handle(&self, i: usize) -> u16 {
        LittleEndian::read_u16(&self.element(i)[0..2])
    }

    pub fn end_handle(&self, i: usize) -> u16 {
        LittleEndian::read_u16(&self.element(i)[2..4])
    }

    pub fn uuid(&self, i: usize) -> Uuid {
        uuid_field(&self.element(i)[4..])
    }

    /// End group handle of the final element
    pub fn last_handle(&self) -> u16 {
        self.end_handle(self.num_elements() - 1)
    }
}

/// Find Information Response packet
///
/// Byte 1 is a format selector rather than a length: 0x01 for 16-bit UUIDs, 0x02 for 128-bit.
#[derive(Debug, Clone, Copy)]
pub struct FindInformationResponse<'a> {
    body: &'a [u8],
    format: u8,
    stride: usize,
}

impl<'a> FindInformationResponse<'a> {
    pub fn parse(pdu: Pdu<'a>) -> AttResult<Self> {
        pdu.expect_opcode(ATT_FIND_INFO_RSP)?;
        let data = pdu.as_bytes();
        if data.len() < ATT_LIST_RSP_HEADER_SIZE {
            return Err(AttError::MalformedPdu("find information response shorter than 2 bytes"));
        }

        let format = data[1];
        let stride = match format {
            ATT_FIND_INFO_RSP_FORMAT_16BIT => 2 + UUID16_LEN,
            ATT_FIND_INFO_RSP_FORMAT_128BIT => 2 + UUID128_LEN,
            _ => return Err(AttError::MalformedPdu("unknown find information format")),
        };

        Ok(Self {
            body: element_list(data, stride)?,
            format,
            stride,
        })
    }

    pub fn format(&self) -> u8 {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn num_elements(&self) -> usize {
        self.body.len() / self.stride
    }

    fn element(&self, i: usize) -> &'a [u8] {
        &self.body[i * self.stride..(i + 1) * self.stride]
    }

    pub fn handle(&self, i: usize) -> u16 {
        LittleEndian::read_u16(&self.element(i)[..2])
    }

    pub fn uuid(&self, i: usize) -> Uuid {
        uuid_field(&self.element(i)[2..])
    }

    pub fn last_handle(&self) -> u16 {
        self.handle(self.num_elements() - 1)
    }
}

/// A decoded PDU, refined by opcode
#[derive(Debug, Clone, Copy)]
pub enum Response<'a> {
    Error(ErrorResponse),
    ReadByType(ReadByTypeResponse<'a>),
    ReadByGroupType(ReadByGroupTypeResponse<'a>),
    FindInformation(FindInformationResponse<'a>),
    /// Any opcode without a dedicated view
    Other(Pdu<'a>),
}

impl<'a> Response<'a> {
    pub fn decode(data: &'a [u8]) -> AttResult<Self> {
        let pdu = Pdu::new(data)?;
        Ok(match pdu.opcode() {
            ATT_ERROR_RSP => Response::Error(ErrorResponse::parse(pdu)?),
            ATT_READ_BY_TYPE_RSP => Response::ReadByType(ReadByTypeResponse::parse(pdu)?),
            ATT_READ_BY_GROUP_TYPE_RSP => {
                Response::ReadByGroupType(ReadByGroupTypeResponse::parse(pdu)?)
            }
            ATT_FIND_INFO_RSP => Response::FindInformation(FindInformationResponse::parse(pdu)?),
            _ => Response::Other(pdu),
        })
    }

    pub fn opcode(&self) -> u8 {
        match self {
            Response::Error(_) => ATT_ERROR_RSP,
            Response::ReadByType(_) => ATT_READ_BY_TYPE_RSP,
            Response::ReadByGroupType(_) => ATT_READ_BY_GROUP_TYPE_RSP,
            Response::FindInformation(_) => ATT_FIND_INFO_RSP,
            Response::Other(pdu) => pdu.opcode(),
        }
    }
}
