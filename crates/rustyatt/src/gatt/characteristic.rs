//! Characteristic declaration decoding
//!
//! A characteristic declaration (type 0x2803) has the value
//! `[properties(1), value handle(2), uuid(2 or 16)]`, so the Read By Type response carrying
//! declarations must have a value size of exactly 5 or 19. The UUID width is inferred from
//! that size; the two widths cannot be mixed in one response since the stride is shared.

use super::types::{Characteristic, CharacteristicProperties};
use crate::att::constants::{ATT_READ_BY_TYPE_REQ, ATT_READ_BY_TYPE_RSP, CHARACTERISTIC_UUID};
use crate::att::discovery::Procedure;
use crate::att::error::{AttError, AttResult};
use crate::att::pdu::{uuid_field, Pdu, ReadByTypeResponse};
use crate::att::types::{AttRequest, HandleRange, ReadByTypeRequest};
use crate::uuid::Uuid;
use byteorder::{ByteOrder, LittleEndian};

/// Declaration value size with a 16-bit UUID
pub const CHARACTERISTIC_DECL_LEN_16: usize = 5;
/// Declaration value size with a 128-bit UUID
pub const CHARACTERISTIC_DECL_LEN_128: usize = 19;

/// Read By Type response whose elements are characteristic declarations
#[derive(Debug, Clone, Copy)]
pub struct CharacteristicDeclarations<'a> {
    inner: ReadByTypeResponse<'a>,
}

impl<'a> CharacteristicDeclarations<'a> {
    pub fn parse(pdu: Pdu<'a>) -> AttResult<Self> {
        Self::from_response(ReadByTypeResponse::parse(pdu)?)
    }

    /// Refine an already parsed Read By Type response
    pub fn from_response(inner: ReadByTypeResponse<'a>) -> AttResult<Self> {
        match inner.value_len() {
            CHARACTERISTIC_DECL_LEN_16 | CHARACTERISTIC_DECL_LEN_128 => Ok(Self { inner }),
            len => Err(AttError::InvalidCharacteristic(len)),
        }
    }

    pub fn num_elements(&self) -> usize {
        self.inner.num_elements()
    }

    /// Handle of the declaration attribute itself
    pub fn declaration_handle(&self, i: usize) -> u16 {
        self.inner.handle(i)
    }

    pub fn characteristic(&self, i: usize) -> Characteristic {
        let value = self.inner.value(i);
        Characteristic {
            handle: LittleEndian::read_u16(&value[1..3]),
            flags: CharacteristicProperties::from_bits_retain(value[0]),
            uuid: uuid_field(&value[3..]),
        }
    }

    pub fn last_handle(&self) -> u16 {
        self.inner.last_handle()
    }
}

/// Characteristic discovery over the whole database, yielding `(declaration handle, characteristic)`
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacteristicDiscovery;

impl Procedure for CharacteristicDiscovery {
    type Page<'a> = CharacteristicDeclarations<'a>;
    type Item = (u16, Characteristic);

    const REQUEST_OPCODE: u8 = ATT_READ_BY_TYPE_REQ;
    const RESPONSE_OPCODE: u8 = ATT_READ_BY_TYPE_RSP;

    fn encode_request(&self, range: HandleRange, buf: &mut [u8]) -> AttResult<usize> {
        ReadByTypeRequest {
            range,
            attribute_type: Uuid::Short(CHARACTERISTIC_UUID),
        }
        .encode(buf)
    }

    fn decode<'a>(&self, pdu: Pdu<'a>) -> AttResult<Self::Page<'a>> {
        CharacteristicDeclarations::parse(pdu)
    }

    fn num_elements(&self, page: &Self::Page<'_>) -> usize {
        page.num_elements()
    }

    fn extract(&self, page: &Self::Page<'_>, index: usize) -> Self::Item {
        (page.declaration_handle(index), page.characteristic(index))
    }

    fn last_handle(&self, page: &Self::Page<'_>) -> u16 {
        page.last_handle()
    }
}
