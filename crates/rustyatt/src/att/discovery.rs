//! Paged discovery over the whole attribute handle space
//!
//! A single response can only carry as many elements as fit in one MTU, so the discovery
//! requests are repeated with a window `[start, 0xFFFF]` whose start moves past the last
//! handle of every page. The loop ends when the server answers with Attribute Not Found for
//! the request, or when a page reaches handle 0xFFFF.
//!
//! The per-request specifics (which request to encode, how to view the response and what to
//! pull out of each element) are supplied by a [`Procedure`]. [`Discovery`] drives one
//! procedure lazily as an iterator; [`discover`] collects it and keeps nothing on failure.
use super::constants::*;
use super::dump;
use super::error::{AttError, AttResult};
use super::pdu::{ErrorResponse, FindInformationResponse, Pdu, ReadByGroupTypeResponse, ReadByTypeResponse};
use super::transport::Transport;
use super::types::{
    AttRequest, FindInformationRequest, HandleRange, ReadByGroupTypeRequest, ReadByTypeRequest,
};
use crate::uuid::Uuid;
use log::{debug, error, trace};
use std::collections::VecDeque;

/// One kind of paged discovery request
pub trait Procedure {
    /// Borrowed view of one success response
    type Page<'a>;
    /// Owned element produced for the caller
    type Item;

    /// Opcode of the request this procedure sends
    const REQUEST_OPCODE: u8;
    /// Opcode of the success response it expects
    const RESPONSE_OPCODE: u8;

    /// Encode the request for `range` into `buf`, returning its length
    fn encode_request(&self, range: HandleRange, buf: &mut [u8]) -> AttResult<usize>;

    /// View a PDU whose opcode is [`Self::RESPONSE_OPCODE`]
    fn decode<'a>(&self, pdu: Pdu<'a>) -> AttResult<Self::Page<'a>>;

    fn num_elements(&self, page: &Self::Page<'_>) -> usize;

    /// Materialise element `index` so it can outlive the receive buffer
    fn extract(&self, page: &Self::Page<'_>, index: usize) -> Self::Item;

    /// Handle the next window must start after
    fn last_handle(&self, page: &Self::Page<'_>) -> u16;
}

/// Pagination state of one discovery call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryWindow {
    pub start: u16,
    pub end: u16,
}

impl Default for DiscoveryWindow {
    fn default() -> Self {
        Self {
            start: ATT_HANDLE_MIN,
            end: ATT_HANDLE_MAX,
        }
    }
}

impl DiscoveryWindow {
    pub fn range(&self) -> HandleRange {
        HandleRange::new(self.start, self.end)
    }

    /// Move past `last`. Returns `false` once the end of the handle space has been reached.
    pub fn advance(&mut self, last: u16) -> AttResult<bool> {
        if last < self.start {
            return Err(AttError::WindowRegression {
                start: self.start,
                last,
            });
        }
        if last >= self.end {
            return Ok(false);
        }
        self.start = last + 1;
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Requesting,
    Done,
    Failed,
}

/// Lazy discovery: requests are only sent once the previous page has been consumed.
///
/// Yields every element in wire order and stops after the first error. A stream cannot be
/// rewound; start a new one to rediscover.
pub struct Discovery<'t, T: Transport + ?Sized, P: Procedure> {
    transport: &'t mut T,
    procedure: P,
    window: DiscoveryWindow,
    buf: Vec<u8>,
    pending: VecDeque<P::Item>,
    state: State,
    requests: usize,
}

impl<'t, T: Transport + ?Sized, P: Procedure> Discovery<'t, T, P> {
    pub fn new(transport: &'t mut T, procedure: P) -> Self {
        let mtu = transport.mtu() as usize;
        Self {
            transport,
            procedure,
            window: DiscoveryWindow::default(),
            buf: vec![0u8; mtu],
            pending: VecDeque::new(),
            state: State::Requesting,
            requests: 0,
        }
    }

    /// Number of requests sent so far
    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn window(&self) -> DiscoveryWindow {
        self.window
    }

    /// Send one request for the current window and handle its response
    fn exchange(&mut self) -> AttResult<()> {
        let len = self.procedure.encode_request(self.window.range(), &mut self.buf)?;
        trace!("Sending {}", dump::describe(&self.buf[..len]));
        self.transport.send(&self.buf[..len])?;
        self.requests += 1;

        let len = self.transport.receive(&mut self.buf)?;
        let pdu = Pdu::new(&self.buf[..len])?;
        trace!("Received {}", dump::describe(pdu.as_bytes()));

        match pdu.opcode() {
            ATT_ERROR_RSP => {
                let err = ErrorResponse::parse(pdu)?;
                if err.request_opcode != P::REQUEST_OPCODE {
                    error!(
                        "Unexpected opcode in error. Expected {} got {}",
                        dump::opcode_name(P::REQUEST_OPCODE),
                        dump::opcode_name(err.request_opcode)
                    );
                    return Err(AttError::UnexpectedErrorOpcode {
                        expected: P::REQUEST_OPCODE,
                        actual: err.request_opcode,
                    });
                }
                if err.is_attribute_not_found() {
                    debug!(
                        "{} finished at 0x{:04x} after {} requests",
                        dump::opcode_name(P::REQUEST_OPCODE),
                        self.window.start,
                        self.requests
                    );
                    self.state = State::Done;
                    return Ok(());
                }
                error!("Received unexpected error: {}", err.code());
                return Err(err.into_error());
            }
            op if op == P::RESPONSE_OPCODE => {}
            op => {
                error!(
                    "Unexpected response. Expected {} got {}",
                    dump::opcode_name(P::RESPONSE_OPCODE),
                    dump::opcode_name(op)
                );
                return Err(AttError::UnexpectedResponse {
                    expected: P::RESPONSE_OPCODE,
                    actual: op,
                });
            }
        }

        let page = self.procedure.decode(pdu)?;
        for i in 0..self.procedure.num_elements(&page) {
            self.pending.push_back(self.procedure.extract(&page, i));
        }
        let last = self.procedure.last_handle(&page);

        if self.window.advance(last)? {
            debug!("New start = 0x{:04x}", self.window.start);
        } else {
            debug!("Reached the end of the handle space");
            self.state = State::Done;
        }
        Ok(())
    }
}

impl<T: Transport + ?Sized, P: Procedure> Iterator for Discovery<'_, T, P> {
    type Item = AttResult<P::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(Ok(item));
            }
            if self.state != State::Requesting {
                return None;
            }
            if let Err(e) = self.exchange() {
                self.state = State::Failed;
                self.pending.clear();
                return Some(Err(e));
            }
        }
    }
}

/// Run `procedure` to completion, returning every element or the first failure
pub fn discover<T: Transport + ?Sized, P: Procedure>(
    transport: &mut T,
    procedure: P,
) -> AttResult<Vec<P::Item>> {
    Discovery::new(transport, procedure).collect()
}

/// Read By Type over the whole database, yielding `(handle, value)`
#[derive(Debug, Clone)]
pub struct ReadByType {
    pub attribute_type: Uuid,
}

impl Procedure for ReadByType {
    type Page<'a> = ReadByTypeResponse<'a>;
    type Item = (u16, Vec<u8>);

    const REQUEST_OPCODE: u8 = ATT_READ_BY_TYPE_REQ;
    const RESPONSE_OPCODE: u8 = ATT_READ_BY_TYPE_RSP;

    fn encode_request(&self, range: HandleRange, buf: &mut [u8]) -> AttResult<usize> {
        ReadByTypeRequest {
            range,
            attribute_type: self.attribute_type,
        }
        .encode(buf)
    }

    fn decode<'a>(&self, pdu: Pdu<'a>) -> AttResult<Self::Page<'a>> {
        ReadByTypeResponse::parse(pdu)
    }

    fn num_elements(&self, page: &Self::Page<'_>) -> usize {
        page.num_elements()
    }

    fn extract(&self, page: &Self::Page<'_>, index: usize) -> Self::Item {
        (page.handle(index), page.value(index).to_vec())
    }

    fn last_handle(&self, page: &Self::Page<'_>) -> u16 {
        page.last_handle()
    }
}

/// Read By Group Type over the whole database, yielding `(start, end, uuid)`
#[derive(Debug, Clone)]
pub struct ReadByGroupType {
    pub group_type: Uuid,
}

impl Procedure for ReadByGroupType {
    type Page<'a> = ReadByGroupTypeResponse<'a>;
    type Item = (u16, u16, Uuid);

    const REQUEST_OPCODE: u8 = ATT_READ_BY_GROUP_TYPE_REQ;
    const RESPONSE_OPCODE: u8 = ATT_READ_BY_GROUP_TYPE_RSP;

    fn encode_request(&self, range: HandleRange, buf: &mut [u8]) -> AttResult<usize> {
        ReadByGroupTypeRequest {
            range,
            group_type: self.group_type,
        }
        .encode(buf)
    }

    fn decode<'a>(&self, pdu: Pdu<'a>) -> AttResult<Self::Page<'a>> {
        ReadByGroupTypeResponse::parse(pdu)
    }

    fn num_elements(&self, page: &Self::Page<'_>) -> usize {
        page.num_elements()
    }

    fn extract(&self, page: &Self::Page<'_>, index: usize) -> Self::Item {
        (
            page.start_handle(index),
            page.end_handle(index),
            page.uuid(index),
        )
    }

    /// Groups are contiguous, so the next window starts after the last group's end
    fn last_handle(&self, page: &Self::Page<'_>) -> u16 {
        page.last_handle()
    }
}

/// Find Information over the whole database, yielding `(handle, type)`
#[derive(Debug, Clone, Default)]
pub struct FindInformation;

impl Procedure for FindInformation {
    type Page<'a> = FindInformationResponse<'a>;
    type Item = (u16, Uuid);

    const REQUEST_OPCODE: u8 = ATT_FIND_INFO_REQ;
    const RESPONSE_OPCODE: u8 = ATT_FIND_INFO_RSP;

    fn encode_request(&self, range: HandleRange, buf: &mut [u8]) -> AttResult<usize> {
        FindInformationRequest { range }.encode(buf)
    }

    fn decode<'a>(&self, pdu: Pdu<'a>) -> AttResult<Self::Page<'a>> {
        FindInformationResponse::parse(pdu)
    }

    fn num_elements(&self, page: &Self::Page<'_>) -> usize {
        page.num_elements()
    }

    fn extract(&self, page: &Self::Page<'_>, index: usize) -> Self::Item {
        (page.handle(index), page.uuid(index))
    }

    fn last_handle(&self, page: &Self::Page<'_>) -> u16 {
        page.last_handle()
    }
}
