//! Channel abstraction carrying ATT PDUs
//!
//! The ATT client only needs a blocking, packet-oriented channel where one `receive` yields
//! exactly one PDU. Connection setup, timeouts and security are the implementor's concern.
use super::constants::ATT_DEFAULT_MTU;
use crate::error::TransportError;

/// A connected, reliable, MTU-bounded datagram channel
pub trait Transport {
    /// Send one PDU
    fn send(&mut self, pdu: &[u8]) -> Result<(), TransportError>;

    /// Block until one PDU arrives, copy it into `buf` and return its length
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Effective ATT MTU of the channel
    fn mtu(&self) -> u16 {
        ATT_DEFAULT_MTU
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, pdu: &[u8]) -> Result<(), TransportError> {
        (**self).send(pdu)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).receive(buf)
    }

    fn mtu(&self) -> u16 {
        (**self).mtu()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted transport: replays queued responses and records every request sent
    pub(crate) struct MockTransport {
        pub(crate) mtu: u16,
        pub(crate) sent: Vec<Vec<u8>>,
        responses: VecDeque<Vec<u8>>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Self {
            Self {
                mtu: ATT_DEFAULT_MTU,
                sent: Vec::new(),
                responses: VecDeque::new(),
            }
        }

        pub(crate) fn queue(&mut self, pdu: &[u8]) -> &mut Self {
            self.responses.push_back(pdu.to_vec());
            self
        }

        pub(crate) fn queue_not_found(&mut self, request_opcode: u8, handle: u16) -> &mut Self {
            let mut pdu = vec![0x01, request_opcode];
            pdu.extend_from_slice(&handle.to_le_bytes());
            pdu.push(0x0A);
            self.queue(&pdu)
        }

        pub(crate) fn pending(&self) -> usize {
            self.responses.len()
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, pdu: &[u8]) -> Result<(), TransportError> {
            assert!(pdu.len() <= self.mtu as usize, "request exceeds MTU");
            self.sent.push(pdu.to_vec());
            Ok(())
        }

        fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            let pdu = self.responses.pop_front().ok_or(TransportError::Disconnected)?;
            let len = pdu.len().min(buf.len());
            buf[..len].copy_from_slice(&pdu[..len]);
            Ok(len)
        }

        fn mtu(&self) -> u16 {
            self.mtu
        }
    }
}
