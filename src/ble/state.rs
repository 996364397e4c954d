use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::watch::{Receiver, Watch};

use super::connection::ConnectionHandle;

const WATCH_BUFFER_SIZE: usize = 4;

pub type BleStateRx<'a> = Receiver<'a, CriticalSectionRawMutex, State, WATCH_BUFFER_SIZE>;

/// Diagnostics view of the link, published on every transition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct State {
    /// Active link, if any
    pub connection: Option<ConnectionHandle>,

    /// Whether the central has subscribed to telemetry notifications
    pub notifications_enabled: bool,

    /// HCI reason of the most recent disconnect
    pub last_disconnect_reason: Option<u8>,

    /// Notifications the stack refused since boot
    pub notify_failures: u32,
}

pub struct StateController {
    state: Mutex<CriticalSectionRawMutex, Cell<State>>,
    watch: Watch<CriticalSectionRawMutex, State, WATCH_BUFFER_SIZE>,
}

impl StateController {
    pub fn new() -> Self {
        let controller = Self {
            state: Mutex::new(Cell::new(State::default())),
            watch: Watch::new(),
        };
        controller.watch.sender().send(State::default());

        controller
    }

    pub fn receiver(&self) -> Option<BleStateRx<'_>> {
        self.watch.receiver()
    }

    pub fn current(&self) -> State {
        self.state.lock(Cell::get)
    }

    /// Mutate the state and publish the result
    pub fn update(&self, f: impl FnOnce(&mut State)) {
        self.state.lock(|cell| {
            let mut state = cell.get();
            f(&mut state);
            cell.set(state);

            // Sent under the lock so receivers never see updates out of order
            self.watch.sender().send(state);
        });
    }
}

impl Default for StateController {
    fn default() -> Self {
        Self::new()
    }
}
