//! Transmission state machine
//!
//! Two strategies are available. With [`TransmitStrategy::Synchronous`], a telegram is passed to
//! the transmit function as soon as it is sent, and no acknowledgment is tracked. With
//! [`TransmitStrategy::Buffered`], the handoff is paced by the transmit task, one byte slot per
//! call, and held back while a reception has just started so the chip can acknowledge it without
//! delay. The acknowledgment of a buffered telegram is then awaited, and a timeout is reported if
//! it never comes.

use defmt_or_log::{debug, error, warn};
use knx_common::{constants::timing::ACK_TIMEOUT_US, AckStatus, Telegram, TransmitError};

use crate::{
    error::{BusySnafu, CouplerError},
    receiver::ReceptionState,
};

/// How sent telegrams are handed to the transmit function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitStrategy {
    /// Hand the telegram over immediately, from `send`
    #[default]
    Synchronous,
    /// Hand the telegram over from the transmit task and wait for its acknowledgment
    Buffered,
}

/// State of the transmission state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmissionState {
    /// Not initialized
    Reset,
    /// Reset done, communication objects can be attached
    Init,
    /// Ready to send
    Idle,
    /// A buffered telegram is being handed over
    TelegramSendingOngoing {
        /// Number of byte slots left before the handoff
        remaining: usize,
    },
    /// A buffered telegram was handed over, and its acknowledgment is awaited
    WaitingAck {
        /// Timestamp of the handoff
        sent_at_us: u32,
    },
}

/// Hands outbound telegrams to the transmit function
#[derive(Debug)]
pub struct TelegramTransmitter<T> {
    state: TransmissionState,
    strategy: TransmitStrategy,
    physical_address: u16,
    pending: Option<T>,
}

impl<T: Telegram> TelegramTransmitter<T> {
    /// Create a transmitter in the `Reset` state
    pub fn new(physical_address: u16, strategy: TransmitStrategy) -> Self {
        Self {
            state: TransmissionState::Reset,
            strategy,
            physical_address,
            pending: None,
        }
    }

    /// Get the current state
    pub fn state(&self) -> TransmissionState {
        self.state
    }

    /// Get the transmit strategy
    pub fn strategy(&self) -> TransmitStrategy {
        self.strategy
    }

    /// The buffered telegram currently being sent, if any
    pub fn pending_telegram(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// Abort any transmission in progress and go to the `Init` state
    pub fn reset(&mut self) {
        self.pending = None;
        self.state = TransmissionState::Init;
    }

    /// Get ready to send
    pub fn init(&mut self) {
        self.state = TransmissionState::Idle;
    }

    /// Send a telegram
    ///
    /// The source address is forced to the physical address of the device, in which case the
    /// checksum is updated as well.
    pub fn send(
        &mut self,
        telegram: &mut T,
        transmit: &dyn Fn(&T) -> Result<(), TransmitError>,
    ) -> Result<(), CouplerError> {
        if self.state != TransmissionState::Idle {
            return BusySnafu.fail();
        }

        if telegram.source_address() != self.physical_address {
            telegram.set_source_address(self.physical_address);
            telegram.update_checksum();
        }

        match self.strategy {
            TransmitStrategy::Synchronous => {
                transmit(telegram)?;
                Ok(())
            }
            TransmitStrategy::Buffered => {
                self.pending = Some(telegram.clone());
                self.state = TransmissionState::TelegramSendingOngoing {
                    remaining: telegram.length(),
                };
                Ok(())
            }
        }
    }

    /// Progress the buffered transmission and track the acknowledgment timeout
    ///
    /// Should be called around every 0.8ms. Returns the status to report to the acknowledgment
    /// callback, when the transmission ended without an acknowledgment.
    pub fn transmit_task(
        &mut self,
        now_us: u32,
        rx_state: ReceptionState,
        transmit: &dyn Fn(&T) -> Result<(), TransmitError>,
    ) -> Option<AckStatus> {
        match self.state {
            TransmissionState::WaitingAck { sent_at_us } => {
                if now_us.wrapping_sub(sent_at_us) > ACK_TIMEOUT_US {
                    warn!("No acknowledgment received for the sent telegram");
                    self.pending = None;
                    self.state = TransmissionState::Idle;
                    Some(AckStatus::NoAnswerTimeout)
                } else {
                    None
                }
            }
            TransmissionState::TelegramSendingOngoing { remaining } => {
                // A reception just started and the chip has to acknowledge it; keep its TX
                // buffer empty until then
                if rx_state == ReceptionState::ReceptionStarted {
                    return None;
                }
                if remaining > 1 {
                    self.state = TransmissionState::TelegramSendingOngoing {
                        remaining: remaining - 1,
                    };
                    return None;
                }

                let result = match self.pending.as_ref() {
                    Some(telegram) => transmit(telegram),
                    None => Ok(()),
                };
                match result {
                    Ok(()) => {
                        self.state = TransmissionState::WaitingAck { sent_at_us: now_us };
                        None
                    }
                    Err(e) => {
                        error!("Transmit function failed with result code {}", e.0);
                        self.pending = None;
                        self.state = TransmissionState::Idle;
                        Some(AckStatus::Nack)
                    }
                }
            }
            _ => None,
        }
    }

    /// An acknowledgment for the sent telegram was received from the bus
    ///
    /// Returns the status to forward to the acknowledgment callback, or `None` when no
    /// acknowledgment was expected.
    pub fn acknowledge(&mut self, status: AckStatus) -> Option<AckStatus> {
        match self.state {
            TransmissionState::WaitingAck { .. } => {
                self.pending = None;
                self.state = TransmissionState::Idle;
                Some(status)
            }
            _ => {
                debug!("Unexpected acknowledgment {:?} in state {:?}", status, self.state);
                None
            }
        }
    }
}
