#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Host stack or GATT server could not be brought up
    StackInit,
    /// Advertising was rejected; the device stays undiscoverable
    Advertise,
    /// Connect callback carried a non-zero HCI status
    Connect(u8),
    /// A second central tried to connect while a link is active
    AlreadyConnected,
}
