//! Transport Abstraction
//!
//! The discovery layer that pairs with the adapter and negotiates GATT is a
//! collaborator, not part of this crate: it is consumed through the
//! [`Transport`] / [`DuplexByteChannel`] seams so the session runs against
//! real hardware, a scripted fake ([`crate::mock`]), or nothing at all.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Common service UUIDs for OBD-II BLE adapters (Veepeak, Vgate, etc.)
pub const SERVICE_UUIDS: [&str; 3] = [
    "0000fff0-0000-1000-8000-00805f9b34fb",
    "0000ffe0-0000-1000-8000-00805f9b34fb",
    "e7810a71-73ae-499d-8c15-faa9aef0c3f2", // Vgate iCar Pro specific
];

/// Common notify/write characteristic UUIDs
pub const CHARACTERISTIC_UUIDS: [&str; 4] = [
    "0000fff1-0000-1000-8000-00805f9b34fb", // Write
    "0000fff2-0000-1000-8000-00805f9b34fb", // Notify
    "0000ffe1-0000-1000-8000-00805f9b34fb",
    "bef8d6c9-9c21-4c9e-b632-bd58c1009f9f",
];

/// Which services/characteristics the opener should accept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceFilter {
    pub service_uuids: Vec<String>,
    pub characteristic_uuids: Vec<String>,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            service_uuids: SERVICE_UUIDS.iter().map(|u| u.to_string()).collect(),
            characteristic_uuids: CHARACTERISTIC_UUIDS.iter().map(|u| u.to_string()).collect(),
        }
    }
}

/// An already-negotiated bidirectional byte channel to the adapter.
///
/// Received fragments arrive on the notification receiver handed out by
/// [`Transport::open`]; this trait covers the outbound half and teardown.
#[async_trait]
pub trait DuplexByteChannel: Send {
    /// Write one framed command to the adapter.
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Release the channel. Idempotent.
    async fn close(&mut self);
}

/// Opens a duplex channel to a device matching the filter.
#[async_trait]
pub trait Transport: Send {
    /// Attempt discovery and connection. On success returns the channel
    /// plus the receiver on which notification fragments are delivered.
    async fn open(
        &mut self,
        filter: &DeviceFilter,
    ) -> Result<(Box<dyn DuplexByteChannel>, mpsc::Receiver<Vec<u8>>), TransportError>;
}
