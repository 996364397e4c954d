use core::sync::atomic::{AtomicBool, Ordering};

/// CCCD value requesting notifications
pub const CCC_NOTIFY: u16 = 0x0001;

/// Decode the little-endian value of a CCCD write
pub fn ccc_value(data: &[u8]) -> Option<u16> {
    match data {
        [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateTransition {
    Enabled,
    Disabled,
}

/// Subscription state of the telemetry characteristic.
///
/// A single atomic flag: every transition is one indivisible swap, so the
/// tick loop can read it while stack callbacks write it.
#[derive(Debug)]
pub struct NotifyGate {
    enabled: AtomicBool,
}

impl NotifyGate {
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Apply a CCCD write. Only an exact notify value opens the gate.
    pub fn apply(&self, ccc_value: u16) -> Option<GateTransition> {
        self.set(ccc_value == CCC_NOTIFY)
    }

    /// Close the gate regardless of the last descriptor value
    pub fn force_disable(&self) -> Option<GateTransition> {
        self.set(false)
    }

    fn set(&self, enabled: bool) -> Option<GateTransition> {
        let previous = self.enabled.swap(enabled, Ordering::AcqRel);

        match (previous, enabled) {
            (false, true) => Some(GateTransition::Enabled),
            (true, false) => Some(GateTransition::Disabled),
            _ => None,
        }
    }
}

impl Default for NotifyGate {
    fn default() -> Self {
        Self::new()
    }
}
