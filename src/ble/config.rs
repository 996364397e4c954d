#[cfg(feature = "esp32")]
use bt_hci::param::{AddrKind, BdAddr};
#[cfg(feature = "esp32")]
use trouble_host::{Address, HostResources};

pub const TELEMETRY_SERVICE_UUID: u128 = 0x7e2a2b10_5b9a_4c8f_9d6a_2f6f2a4f8b01;
pub const TELEMETRY_CHARACTERISTIC_UUID: u128 = 0x7e2a2b11_5b9a_4c8f_9d6a_2f6f2a4f8b01;

/// Period of the sample-and-notify loop (1 Hz)
pub const TICK_PERIOD_MS: u64 = 1000;

#[cfg(feature = "esp32")]
const L2CAP_MTU: usize = 255;
#[cfg(feature = "esp32")]
const CONNECTIONS_MAX: usize = 1;
#[cfg(feature = "esp32")]
const L2CAP_CHANNELS_MAX: usize = 2; // Signal + att

#[cfg(feature = "esp32")]
pub type Resources = HostResources<CONNECTIONS_MAX, L2CAP_CHANNELS_MAX, L2CAP_MTU>;

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Name of the BLE device, sent as the complete local name
    pub name: &'static str,

    /// Public address of the BLE device
    pub address: [u8; 6],

    /// Period of the telemetry tick in milliseconds
    pub tick_period_ms: u64,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            name: "ASL Glove Testing",
            address: [0x48, 0xca, 0x43, 0x3b, 0x0f, 0xa9],
            tick_period_ms: TICK_PERIOD_MS,
        }
    }

    #[cfg(feature = "esp32")]
    pub fn host_address(&self) -> Address {
        Address {
            kind: AddrKind::PUBLIC,
            addr: BdAddr::new(self.address),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
