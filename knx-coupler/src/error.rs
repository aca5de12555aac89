use knx_common::{constants::result_codes, TransmitError};
use snafu::Snafu;

/// Errors returned by the [`BusCoupler`](crate::BusCoupler) operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CouplerError {
    /// The operation is only allowed after a reset, before init
    #[snafu(display("Coupler is not in its init state"))]
    NotInitState,
    /// The transmitter is not initialized, or a telegram is already being sent
    #[snafu(display("Transmitter is busy or not initialized"))]
    Busy,
    /// The transmit function failed
    #[snafu(display("Transmit function failed with result code {code}"))]
    Transmit {
        /// Result code returned by the transmit function
        code: u8,
    },
}

impl CouplerError {
    /// The numeric result code matching this error
    pub fn code(&self) -> u8 {
        match self {
            CouplerError::NotInitState => result_codes::ERROR_NOT_INIT_STATE,
            CouplerError::Busy => result_codes::ERROR,
            CouplerError::Transmit { code } => *code,
        }
    }
}

impl From<TransmitError> for CouplerError {
    fn from(value: TransmitError) -> Self {
        CouplerError::Transmit { code: value.0 }
    }
}
