#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Must come first so the logging macros are visible to every module below.
mod fmt;

pub mod ble;
pub mod telemetry;
