//! Request PDUs for the ATT discovery procedures
//!
//! Requests are encoded into a caller-provided buffer sized to the effective MTU, so a request
//! that cannot fit is rejected before anything reaches the transport. Each request also has a
//! `parse` counterpart, mainly useful for checking what was put on the wire.
use super::constants::*;
use super::error::{AttError, AttResult};
use crate::uuid::Uuid;
use byteorder::{ByteOrder, LittleEndian};

/// Inclusive attribute handle range covered by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleRange {
    /// First requested handle
    pub start: u16,
    /// Last requested handle
    pub end: u16,
}

impl HandleRange {
    /// The whole attribute database
    pub const ALL: HandleRange = HandleRange {
        start: ATT_HANDLE_MIN,
        end: ATT_HANDLE_MAX,
    };

    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// A range is valid when it is non-empty and does not include handle 0
    pub fn is_valid(&self) -> bool {
        self.start >= ATT_HANDLE_MIN && self.start <= self.end
    }
}

/// ATT request formats
pub trait AttRequest: Sized {
    /// Opcode for this request
    const OPCODE: u8;

    /// Number of bytes the encoded request occupies
    fn encoded_len(&self) -> usize;

    /// Encode into `buf`, returning the PDU length
    fn encode(&self, buf: &mut [u8]) -> AttResult<usize>;

    /// Parse a request from bytes
    fn parse(data: &[u8]) -> AttResult<Self>;
}

fn check_range(range: HandleRange) -> AttResult<()> {
    if !range.is_valid() {
        return Err(AttError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    Ok(())
}

fn check_capacity(needed: usize, buf: &[u8]) -> AttResult<()> {
    if buf.len() < needed {
        return Err(AttError::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}

fn write_range(opcode: u8, range: HandleRange, buf: &mut [u8]) {
    buf[0] = opcode;
    LittleEndian::write_u16(&mut buf[1..3], range.start);
    LittleEndian::write_u16(&mut buf[3..5], range.end);
}

fn read_range(opcode: u8, data: &[u8]) -> AttResult<HandleRange> {
    if data.len() < ATT_RANGE_REQ_HEADER_SIZE {
        return Err(AttError::MalformedPdu("request shorter than its handle range"));
    }
    if data[0] != opcode {
        return Err(AttError::MalformedPdu("unexpected request opcode"));
    }
    Ok(HandleRange {
        start: LittleEndian::read_u16(&data[1..3]),
        end: LittleEndian::read_u16(&data[3..5]),
    })
}

fn encode_typed(opcode: u8, range: HandleRange, uuid: &Uuid, buf: &mut [u8]) -> AttResult<usize> {
    check_range(range)?;
    let len = ATT_RANGE_REQ_HEADER_SIZE + uuid.encoded_len();
    check_capacity(len, buf)?;

    write_range(opcode, range, buf);
    uuid.write_le(&mut buf[ATT_RANGE_REQ_HEADER_SIZE..])
        .ok_or(AttError::BufferTooSmall {
            needed: len,
            available: buf.len(),
        })?;

    Ok(len)
}

fn parse_typed(opcode: u8, data: &[u8]) -> AttResult<(HandleRange, Uuid)> {
    let range = read_range(opcode, data)?;
    let uuid = Uuid::from_le_slice(&data[ATT_RANGE_REQ_HEADER_SIZE..])
        .ok_or(AttError::MalformedPdu("attribute type must be 2 or 16 bytes"))?;
    Ok((range, uuid))
}

/// Find Information Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindInformationRequest {
    pub range: HandleRange,
}

impl AttRequest for FindInformationRequest {
    const OPCODE: u8 = ATT_FIND_INFO_REQ;

    fn encoded_len(&self) -> usize {
        ATT_RANGE_REQ_HEADER_SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> AttResult<usize> {
        check_range(self.range)?;
        check_capacity(ATT_RANGE_REQ_HEADER_SIZE, buf)?;
        write_range(Self::OPCODE, self.range, buf);
        Ok(ATT_RANGE_REQ_HEADER_SIZE)
    }

    fn parse(data: &[u8]) -> AttResult<Self> {
        if data.len() != ATT_RANGE_REQ_HEADER_SIZE {
            return Err(AttError::MalformedPdu("find information request must be 5 bytes"));
        }
        Ok(Self {
            range: read_range(Self::OPCODE, data)?,
        })
    }
}

/// Read By Type Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadByTypeRequest {
    pub range: HandleRange,
    /// Attribute type UUID
    pub attribute_type: Uuid,
}

impl AttRequest for ReadByTypeRequest {
    const OPCODE: u8 = ATT_READ_BY_TYPE_REQ;

    fn encoded_len(&self) -> usize {
        ATT_RANGE_REQ_HEADER_SIZE + self.attribute_type.encoded_len()
    }

    fn encode(&self, buf: &mut [u8]) -> AttResult<usize> {
        encode_typed(Self::OPCODE, self.range, &self.attribute_type, buf)
    }

    fn parse(data: &[u8]) -> AttResult<Self> {
        let (range, attribute_type) = parse_typed(Self::OPCODE, data)?;
        Ok(Self {
            range,
            attribute_type,
        })
    }
}

/// Read By Group Type Request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadByGroupTypeRequest {
    pub range: HandleRange,
    /// Grouping attribute type, e.g. Primary Service
    pub group_type: Uuid,
}

impl AttRequest for ReadByGroupTypeRequest {
    const OPCODE: u8 = ATT_READ_BY_GROUP_TYPE_REQ;

    fn encoded_len(&self) -> usize {
        ATT_RANGE_REQ_HEADER_SIZE + self.group_type.encoded_len()
    }

    fn encode(&self, buf: &mut [u8]) -> AttResult<usize> {
        encode_typed(Self::OPCODE, self.range, &self.group_type, buf)
    }

    fn parse(data: &[u8]) -> AttResult<Self> {
        let (range, group_type) = parse_typed(Self::OPCODE, data)?;
        Ok(Self { range, group_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_by_type_layout() {
        let req = ReadByTypeRequest {
            range: HandleRange::new(0x0001, 0xFFFF),
            attribute_type: Uuid::from_u16(CHARACTERISTIC_UUID),
        };
        let mut buf = [0u8; ATT_DEFAULT_MTU as usize];
        let len = req.encode(&mut buf).unwrap();

        assert_eq!(len, 7);
        assert_eq!(&buf[..len], &[0x08, 0x01, 0x00, 0xFF, 0xFF, 0x03, 0x28]);
        assert_eq!(ReadByTypeRequest::parse(&buf[..len]).unwrap(), req);
    }

    #[test]
    fn test_group_request_with_full_uuid() {
        let uuid: Uuid = "6e400001-b5a3-f393-e0a9-e50e24dcca9e".parse().unwrap();
        let req = ReadByGroupTypeRequest {
            range: HandleRange::new(0x0010, 0x0020),
            group_type: uuid,
        };
        let mut buf = [0u8; ATT_DEFAULT_MTU as usize];
        let len = req.encode(&mut buf).unwrap();

        assert_eq!(len, 21);
        assert_eq!(buf[0], ATT_READ_BY_GROUP_TYPE_REQ);
        assert_eq!(LittleEndian::read_u16(&buf[1..3]), 0x0010);
        assert_eq!(LittleEndian::read_u16(&buf[3..5]), 0x0020);
        assert_eq!(buf[5], 0x9e);

        let parsed = ReadByGroupTypeRequest::parse(&buf[..len]).unwrap();
        assert_eq!(parsed.range, req.range);
        assert_eq!(parsed.group_type, uuid);
    }

    #[test]
    fn test_find_information_layout() {
        let req = FindInformationRequest {
            range: HandleRange::new(0x0024, 0xFFFF),
        };
        let mut buf = [0u8; 8];
        let len = req.encode(&mut buf).unwrap();

        assert_eq!(&buf[..len], &[0x04, 0x24, 0x00, 0xFF, 0xFF]);
        assert_eq!(FindInformationRequest::parse(&buf[..len]).unwrap(), req);
    }

    #[test]
    fn test_encode_rejects_small_buffer() {
        let req = ReadByTypeRequest {
            range: HandleRange::ALL,
            attribute_type: Uuid::Full([0xAA; 16]),
        };
        let mut buf = [0u8; 20];
        match req.encode(&mut buf) {
            Err(AttError::BufferTooSmall { needed, available }) => {
                assert_eq!(needed, 21);
                assert_eq!(available, 20);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // Nothing was written
        assert_eq!(buf, [0u8; 20]);
    }

    #[test]
    fn test_parse_rejects_bad_uuid_width() {
        let data = [0x08, 0x01, 0x00, 0xFF, 0xFF, 0x03, 0x28, 0x00];
        assert!(matches!(
            ReadByTypeRequest::parse(&data),
            Err(AttError::MalformedPdu(_))
        ));
        assert!(matches!(
            ReadByTypeRequest::parse(&[0x10, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x28]),
            Err(AttError::MalformedPdu("unexpected request opcode"))
        ));
    }

    #[test]
    fn test_handle_range_validity() {
        assert!(HandleRange::ALL.is_valid());
        assert!(HandleRange::new(5, 5).is_valid());
        assert!(!HandleRange::new(0, 5).is_valid());
        assert!(!HandleRange::new(6, 5).is_valid());
    }

    #[test]
    fn test_encode_rejects_invalid_range() {
        for range in [HandleRange::new(0, 5), HandleRange::new(6, 5)] {
            let mut buf = [0u8; ATT_DEFAULT_MTU as usize];
            let typed = ReadByTypeRequest {
                range,
                attribute_type: Uuid::Short(CHARACTERISTIC_UUID),
            };
            assert!(matches!(
                typed.encode(&mut buf),
                Err(AttError::InvalidRange { start, end }) if start == range.start && end == range.end
            ));

            let group = ReadByGroupTypeRequest {
                range,
                group_type: Uuid::Short(PRIMARY_SERVICE_UUID),
            };
            assert!(matches!(group.encode(&mut buf), Err(AttError::InvalidRange { .. })));

            let info = FindInformationRequest { range };
            assert!(matches!(info.encode(&mut buf), Err(AttError::InvalidRange { .. })));

            assert_eq!(buf, [0u8; ATT_DEFAULT_MTU as usize]);
        }
    }
}
