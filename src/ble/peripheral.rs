use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::config::Config;
use super::connection::{ConnectionHandle, ConnectionTracker};
use super::error::Error;
use super::gate::{GateTransition, NotifyGate};
use super::ports::{AdvertisingPort, AdvertisingRequest, LinkEvent, NotifyPort};
use super::state::{BleStateRx, State, StateController};
use crate::telemetry::{read_range, Frame, SampleSource, TelemetryRecord};

/// Result of one telemetry tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Record refreshed; no link or no subscription, nothing sent
    Idle,
    Sent,
    /// The stack refused the notification; the next tick tries again
    SendFailed,
}

/// The glove's telemetry peripheral: one record, one link, one subscription.
///
/// Stack callbacks and the tick loop share this by reference. Link state lives
/// in lock-free atomics; the record is only ever copied in and out whole.
pub struct PeripheralService {
    config: Config,
    gate: NotifyGate,
    tracker: ConnectionTracker,
    record: Mutex<CriticalSectionRawMutex, Cell<TelemetryRecord>>,
    state: StateController,
}

impl PeripheralService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            gate: NotifyGate::new(),
            tracker: ConnectionTracker::new(),
            record: Mutex::new(Cell::new(TelemetryRecord::ZERO)),
            state: StateController::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> Option<ConnectionHandle> {
        self.tracker.current()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    /// Copy of the latest record
    pub fn snapshot(&self) -> TelemetryRecord {
        self.record.lock(Cell::get)
    }

    /// Latest record in wire layout
    pub fn frame(&self) -> Frame {
        self.snapshot().to_bytes()
    }

    pub fn state(&self) -> State {
        self.state.current()
    }

    /// Receiver for link diagnostics, `None` once all receiver slots are taken
    pub fn subscribe(&self) -> Option<BleStateRx<'_>> {
        self.state.receiver()
    }

    /// Advertise connectable with the device name until a central connects
    pub async fn advertise<A: AdvertisingPort>(&self, port: &mut A) -> Result<A::Link, Error> {
        let request = AdvertisingRequest {
            name: self.config.name,
            connectable: true,
            include_name: true,
        };

        info!("Advertising as \"{}\"", self.config.name);

        port.advertise(&request).await.map_err(|_| {
            error!("Advertising failed to start");
            Error::Advertise
        })
    }

    /// Dispatch a stack callback
    pub fn handle_event(&self, event: LinkEvent) -> Result<(), Error> {
        match event {
            LinkEvent::Connected { handle, status } => self.on_connected(handle, status),
            LinkEvent::Disconnected { handle, reason } => {
                self.on_disconnected(handle, reason);
                Ok(())
            }
            LinkEvent::SubscriptionWritten { value } => {
                self.on_subscription_write(value);
                Ok(())
            }
        }
    }

    /// Connect callback. A failed connect is reported, never retried here.
    pub fn on_connected(&self, handle: ConnectionHandle, status: u8) -> Result<(), Error> {
        if status != 0 {
            warn!("Connection failed (err {})", status);
            return Err(Error::Connect(status));
        }

        if let Err(e) = self.tracker.connect(handle) {
            warn!("Refusing second connection (handle {})", handle.0);
            return Err(e);
        }

        info!("Connected (handle {})", handle.0);
        self.state.update(|state| state.connection = Some(handle));

        Ok(())
    }

    pub fn on_disconnected(&self, handle: ConnectionHandle, reason: u8) {
        let Some(transition) = self.tracker.disconnect(handle, &self.gate) else {
            warn!("Ignoring disconnect of unknown handle {}", handle.0);
            return;
        };

        info!("Disconnected (reason {})", reason);
        if transition.is_some() {
            info!("Notify DISABLED");
        }

        self.state.update(|state| {
            state.connection = None;
            state.notifications_enabled = false;
            state.last_disconnect_reason = Some(reason);
        });
    }

    /// CCCD write callback. Writes outside a connection are dropped.
    pub fn on_subscription_write(&self, value: u16) {
        if !self.tracker.is_connected() {
            warn!("Ignoring subscription write {} without a connection", value);
            return;
        }

        let transition = self.gate.apply(value);

        // A disconnect landing between the check and the write already
        // published the closed gate; undo the write and stay quiet.
        if !self.tracker.is_connected() {
            self.gate.force_disable();
            return;
        }

        let enabled = match transition {
            Some(GateTransition::Enabled) => true,
            Some(GateTransition::Disabled) => false,
            None => return,
        };

        info!("Notify {}", if enabled { "ENABLED" } else { "DISABLED" });
        self.state.update(|state| state.notifications_enabled = enabled);
    }

    /// Read callback: copy `[offset, offset + buf.len())` of the current frame
    /// into `buf`, clipped to the frame. Returns the number of bytes written.
    pub fn on_read(&self, offset: usize, buf: &mut [u8]) -> usize {
        let frame = self.frame();
        let range = read_range(&frame, offset, buf.len());

        buf[..range.len()].copy_from_slice(range);
        range.len()
    }

    /// One period of the telemetry loop: sample, then notify if the link is up
    /// and the central subscribed.
    pub async fn tick<S, N>(&self, uptime_ms: u64, source: &mut S, port: &mut N) -> TickOutcome
    where
        S: SampleSource,
        N: NotifyPort,
    {
        let mut record = self.snapshot();
        record.refresh(uptime_ms, source);
        self.record.lock(|cell| cell.set(record));

        debug!("Sampled t={} s", record.uptime_s);

        let Some(handle) = self.tracker.current() else {
            return TickOutcome::Idle;
        };
        if !self.gate.is_enabled() {
            return TickOutcome::Idle;
        }

        match port.notify(handle, &record.to_bytes()).await {
            Ok(()) => TickOutcome::Sent,
            Err(_) => {
                warn!("Notify failed (handle {})", handle.0);
                self.state.update(|state| {
                    state.notify_failures = state.notify_failures.saturating_add(1)
                });
                TickOutcome::SendFailed
            }
        }
    }
}
