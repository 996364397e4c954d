use core::sync::atomic::{AtomicU16, Ordering};

use super::error::Error;
use super::gate::{GateTransition, NotifyGate};

/// HCI handles are 12 bits wide, so this never names a real link
const NO_CONNECTION: u16 = u16::MAX;

/// Identifies the link to the single connected central
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionHandle(pub u16);

/// Lifecycle of the one allowed connection: idle or connected.
#[derive(Debug)]
pub struct ConnectionTracker {
    handle: AtomicU16,
}

impl ConnectionTracker {
    pub const fn new() -> Self {
        Self {
            handle: AtomicU16::new(NO_CONNECTION),
        }
    }

    pub fn current(&self) -> Option<ConnectionHandle> {
        match self.handle.load(Ordering::Acquire) {
            NO_CONNECTION => None,
            raw => Some(ConnectionHandle(raw)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.current().is_some()
    }

    /// Idle to connected. A second link is refused and the active one kept.
    pub fn connect(&self, handle: ConnectionHandle) -> Result<(), Error> {
        self.handle
            .compare_exchange(NO_CONNECTION, handle.0, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| Error::AlreadyConnected)
    }

    /// Connected to idle for the active handle, closing `gate` on the way.
    ///
    /// Returns `None` when `handle` is not the active link.
    pub fn disconnect(
        &self,
        handle: ConnectionHandle,
        gate: &NotifyGate,
    ) -> Option<Option<GateTransition>> {
        self.handle
            .compare_exchange(handle.0, NO_CONNECTION, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| gate.force_disable())
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}
