//! GATT Client implementation
//!
//! This module provides a client for discovering the services and characteristics of a GATT
//! server. It layers GATT meaning over the ATT discovery calls and adds no state of its own.

use super::characteristic::CharacteristicDiscovery;
use super::types::{Characteristic, Service};
use crate::att::{AttClient, AttResult, Discovery, Transport, PRIMARY_SERVICE_UUID};
use crate::uuid::Uuid;
use log::debug;

/// GATT client over an ATT bearer
#[derive(Debug)]
pub struct GattClient<T: Transport> {
    att: AttClient<T>,
}

impl<T: Transport> GattClient<T> {
    /// Create a new GATT client over an already-connected transport
    pub fn new(transport: T) -> Self {
        Self {
            att: AttClient::new(transport),
        }
    }

    /// Underlying ATT client
    pub fn att(&mut self) -> &mut AttClient<T> {
        &mut self.att
    }

    pub fn into_inner(self) -> T {
        self.att.into_inner()
    }

    /// Read every characteristic declaration in the database.
    ///
    /// Returns `(declaration handle, characteristic)` pairs in handle order.
    pub fn read_characteristics(&mut self) -> AttResult<Vec<(u16, Characteristic)>> {
        let characteristics = self.att.discover(CharacteristicDiscovery)?;
        debug!("Discovered {} characteristics", characteristics.len());
        Ok(characteristics)
    }

    /// Lazily read characteristic declarations, one request per consumed page
    pub fn characteristics(&mut self) -> Discovery<'_, T, CharacteristicDiscovery> {
        self.att.stream(CharacteristicDiscovery)
    }

    /// Discover all primary services on the connected device
    pub fn discover_primary_services(&mut self) -> AttResult<Vec<Service>> {
        let services: Vec<Service> = self
            .att
            .read_by_group_type(&Uuid::from_u16(PRIMARY_SERVICE_UUID))?
            .into_iter()
            .map(|(start_handle, end_handle, uuid)| Service {
                uuid,
                start_handle,
                end_handle,
            })
            .collect();
        debug!("Discovered {} primary services", services.len());
        Ok(services)
    }

    pub fn read_by_type(&mut self, attribute_type: &Uuid) -> AttResult<Vec<(u16, Vec<u8>)>> {
        self.att.read_by_type(attribute_type)
    }

    pub fn read_by_group_type(&mut self, group_type: &Uuid) -> AttResult<Vec<(u16, u16, Uuid)>> {
        self.att.read_by_group_type(group_type)
    }

    pub fn find_information(&mut self) -> AttResult<Vec<(u16, Uuid)>> {
        self.att.find_information()
    }
}
