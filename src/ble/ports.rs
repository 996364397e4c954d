//! Capabilities the peripheral core needs from the host stack.
//!
//! The ESP32 build implements these on top of trouble-host; tests use
//! recording mocks.

use super::connection::ConnectionHandle;
use crate::telemetry::Frame;

/// What to put on air while waiting for a central
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingRequest<'a> {
    pub name: &'a str,
    pub connectable: bool,
    pub include_name: bool,
}

#[allow(async_fn_in_trait)]
pub trait AdvertisingPort {
    /// Link handed back once a central connects
    type Link;
    type Error;

    /// Advertise until a central connects
    async fn advertise(
        &mut self,
        request: &AdvertisingRequest<'_>,
    ) -> Result<Self::Link, Self::Error>;
}

#[allow(async_fn_in_trait)]
pub trait NotifyPort {
    type Error;

    /// Best-effort push of one telemetry frame on the characteristic value
    async fn notify(
        &mut self,
        connection: ConnectionHandle,
        payload: &Frame,
    ) -> Result<(), Self::Error>;
}

/// Callback delivered by the host stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Connect callback; non-zero `status` means the connection failed
    Connected {
        handle: ConnectionHandle,
        status: u8,
    },
    Disconnected {
        handle: ConnectionHandle,
        reason: u8,
    },
    /// Peer wrote the subscription descriptor
    SubscriptionWritten { value: u16 },
}
