pub mod config;
pub mod connection;
mod error;
pub mod gate;
pub mod peripheral;
pub mod ports;
pub mod state;

// ESP32-specific modules
#[cfg(feature = "esp32")]
pub mod driver;
#[cfg(feature = "esp32")]
mod service;

pub use error::Error;
pub use peripheral::{PeripheralService, TickOutcome};
