//! Notifications emitted by the coupler

/// Events reported to the application through the event callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CouplerEvent {
    /// A telegram addressed to one of the attached objects was received with a valid checksum
    TelegramReceived,
    /// A telegram was incomplete, had an invalid length, or a wrong checksum
    ReceptionError,
}

/// Outcome of a telegram transmission, reported to the acknowledgment callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckStatus {
    /// The telegram was acknowledged by the receiver
    Ack,
    /// The receiver rejected the telegram, or it could not be handed to the bus
    Nack,
    /// The receiver was busy
    Busy,
    /// No acknowledgment was received before the timeout expired
    NoAnswerTimeout,
}

/// Operating mode of the coupler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CouplerMode {
    /// Telegrams addressed to the attached objects are received, and telegrams can be sent
    #[default]
    Normal,
    /// All bus traffic is captured byte by byte, see the bus monitor
    BusMonitor,
}
