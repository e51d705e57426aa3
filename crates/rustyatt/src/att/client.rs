//! ATT Client implementation
//!
//! A blocking client for the paged discovery requests. It owns the transport exclusively,
//! so at most one request is ever outstanding on the connection.
use super::discovery::{self, Discovery, FindInformation, Procedure, ReadByGroupType, ReadByType};
use super::error::AttResult;
use super::transport::Transport;
use crate::uuid::Uuid;

/// ATT Client
#[derive(Debug)]
pub struct AttClient<T: Transport> {
    transport: T,
}

impl<T: Transport> AttClient<T> {
    /// Create a new ATT client over an already-connected transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Effective MTU of the underlying channel
    pub fn mtu(&self) -> u16 {
        self.transport.mtu()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Run a discovery procedure to completion
    pub fn discover<P: Procedure>(&mut self, procedure: P) -> AttResult<Vec<P::Item>> {
        discovery::discover(&mut self.transport, procedure)
    }

    /// Run a discovery procedure lazily, one request per consumed page
    pub fn stream<P: Procedure>(&mut self, procedure: P) -> Discovery<'_, T, P> {
        Discovery::new(&mut self.transport, procedure)
    }

    /// Read By Type over the whole database
    pub fn read_by_type(&mut self, attribute_type: &Uuid) -> AttResult<Vec<(u16, Vec<u8>)>> {
        self.discover(ReadByType {
            attribute_type: *attribute_type,
        })
    }

    /// Read By Group Type over the whole database
    pub fn read_by_group_type(&mut self, group_type: &Uuid) -> AttResult<Vec<(u16, u16, Uuid)>> {
        self.discover(ReadByGroupType {
            group_type: *group_type,
        })
    }

    /// Find Information over the whole database
    pub fn find_information(&mut self) -> AttResult<Vec<(u16, Uuid)>> {
        self.discover(FindInformation)
    }
}
