use trouble_host::prelude::gatt_service;

use super::config::{TELEMETRY_CHARACTERISTIC_UUID, TELEMETRY_SERVICE_UUID};
use crate::telemetry::FRAME_LEN;

#[gatt_service(uuid = TELEMETRY_SERVICE_UUID)]
pub struct TelemetryService {
    /// Latest telemetry frame; `notify` adds the subscription descriptor
    #[characteristic(uuid = TELEMETRY_CHARACTERISTIC_UUID, read, notify, value = [0; FRAME_LEN])]
    pub frame: [u8; FRAME_LEN],
}
