#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Frame shorter than the fixed wire layout; carries the received length
    FrameLength(usize),
}
