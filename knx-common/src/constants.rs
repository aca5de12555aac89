//! Constants defining bus timings and legacy result codes

/// Timing values for the TP-UART byte stream, in microseconds
pub mod timing {
    /// Silence after the last received byte which marks the end of a telegram
    ///
    /// At 19200 baud a character takes 0.58ms, and the bus guarantees a gap of 2 to 2.5ms between
    /// telegrams.
    pub const EOP_TIMEOUT_US: u32 = 2_000;
    /// Time to wait for the acknowledgment of a sent telegram before reporting a timeout
    ///
    /// A max sized telegram takes 40ms to emit and may be repeated 3 times, and may be delayed by
    /// other traffic on the bus. The value is around 3 times the worst case emission duration.
    pub const ACK_TIMEOUT_US: u32 = 500_000;
    /// Longest allowed period between two calls of the receive task
    pub const MAX_RX_TASK_PERIOD_US: u32 = 500;
    /// Recommended period for calling the receive task
    pub const RX_TASK_PERIOD_US: u32 = 400;
    /// Recommended period for calling the transmit task
    pub const TX_TASK_PERIOD_US: u32 = 800;
}

/// Numeric result codes of the coupler API, for callers that report a single byte status
pub mod result_codes {
    /// The operation succeeded
    pub const OK: u8 = 0;
    /// The operation requires the coupler to be in its init state
    pub const ERROR_NOT_INIT_STATE: u8 = 254;
    /// Generic error, e.g. the transmitter is busy or not initialized
    pub const ERROR: u8 = 255;
}
