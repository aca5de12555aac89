//! Reception state machine
//!
//! The byte level transport drives the framing of the telegram being received through the
//! `start_reception`, `byte_received`, `resolve_target` and `length_invalid` hooks. Completion of
//! a telegram is then signaled either by silence on the bus (polled mode, see
//! [`TelegramReceiver::poll_eop`]), or by the transport handing over a complete telegram (push
//! mode, see [`TelegramReceiver::deliver`]).

use defmt_or_log::debug;
use knx_common::{constants::timing::EOP_TIMEOUT_US, CouplerEvent, Telegram};

use crate::com_object_index::ComObjectIndex;

/// State of the reception state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceptionState {
    /// Not initialized
    Reset,
    /// Reset done, communication objects can be attached
    Init,
    /// Waiting for the control field of the next telegram
    IdleWaitingForControlField,
    /// A telegram is being received, its target is not known yet
    ReceptionStarted,
    /// The length field of the telegram being received is invalid
    ReceptionLengthInvalid,
    /// The telegram being received targets one of the attached objects
    ReceptionAddressed {
        /// Position of the targeted object in the attached list
        index: u8,
    },
    /// The telegram being received does not concern this device
    ReceptionNotAddressed,
}

impl ReceptionState {
    /// True while a telegram frame is being received
    pub fn is_receiving(&self) -> bool {
        matches!(
            self,
            ReceptionState::ReceptionStarted
                | ReceptionState::ReceptionLengthInvalid
                | ReceptionState::ReceptionAddressed { .. }
                | ReceptionState::ReceptionNotAddressed
        )
    }
}

#[derive(Debug, Clone)]
struct Delivered<T> {
    index: u8,
    telegram: T,
}

/// Tracks inbound telegrams and decides which ones are delivered to the application
#[derive(Debug)]
pub struct TelegramReceiver<T> {
    state: ReceptionState,
    /// The telegram being received
    staged: T,
    last_byte_us: u32,
    delivered: Option<Delivered<T>>,
}

impl<T: Telegram + Default> Default for TelegramReceiver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Telegram + Default> TelegramReceiver<T> {
    /// Create a receiver in the `Reset` state
    pub fn new() -> Self {
        Self {
            state: ReceptionState::Reset,
            staged: T::default(),
            last_byte_us: 0,
            delivered: None,
        }
    }

    /// Get the current state
    pub fn state(&self) -> ReceptionState {
        self.state
    }

    /// Abort any reception in progress and go to the `Init` state
    pub fn reset(&mut self) {
        self.staged = T::default();
        self.state = ReceptionState::Init;
    }

    /// Start waiting for telegrams
    pub fn init(&mut self) {
        self.state = ReceptionState::IdleWaitingForControlField;
    }

    /// The control field of a new telegram was received
    pub fn start_reception(&mut self, now_us: u32) {
        if self.state != ReceptionState::IdleWaitingForControlField {
            debug!("Reception start ignored in state {:?}", self.state);
            return;
        }
        self.staged = T::default();
        self.last_byte_us = now_us;
        self.state = ReceptionState::ReceptionStarted;
    }

    /// Access the telegram being received, for the transport to fill in
    pub fn staged_telegram_mut(&mut self) -> &mut T {
        &mut self.staged
    }

    /// Access the telegram being received
    pub fn staged_telegram(&self) -> &T {
        &self.staged
    }

    /// Any byte of the telegram being received arrived
    pub fn byte_received(&mut self, now_us: u32) {
        if self.state.is_receiving() {
            self.last_byte_us = now_us;
        }
    }

    /// The target address of the staged telegram is complete, find out whether it concerns us
    pub fn resolve_target(&mut self, index: &ComObjectIndex, now_us: u32) {
        if self.state != ReceptionState::ReceptionStarted {
            debug!("Target resolution ignored in state {:?}", self.state);
            return;
        }
        self.last_byte_us = now_us;
        self.state = match index.find(self.staged.target_address()) {
            Some(index) => ReceptionState::ReceptionAddressed { index },
            None => ReceptionState::ReceptionNotAddressed,
        };
    }

    /// The length field of the telegram being received is not valid
    ///
    /// Only telegrams whose target is unknown yet or addressed to us are flagged. A bad frame for
    /// another device is left to end silently.
    pub fn length_invalid(&mut self, now_us: u32) {
        if !matches!(
            self.state,
            ReceptionState::ReceptionStarted
                | ReceptionState::ReceptionLengthInvalid
                | ReceptionState::ReceptionAddressed { .. }
        ) {
            debug!("Invalid length ignored in state {:?}", self.state);
            return;
        }
        self.last_byte_us = now_us;
        self.state = ReceptionState::ReceptionLengthInvalid;
    }

    /// Detect the end of the telegram being received
    ///
    /// Must be called at least every 0.5ms, as the end of a packet is detected by a silence of
    /// more than 2ms. `now_us` is a free running, wrapping microsecond counter.
    ///
    /// Returns the event to report when a telegram ended.
    pub fn poll_eop(&mut self, now_us: u32) -> Option<CouplerEvent> {
        if !self.state.is_receiving() {
            return None;
        }
        if now_us.wrapping_sub(self.last_byte_us) <= EOP_TIMEOUT_US {
            return None;
        }

        let event = match self.state {
            // EOP is not expected now, the telegram is incomplete
            ReceptionState::ReceptionStarted | ReceptionState::ReceptionLengthInvalid => {
                Some(CouplerEvent::ReceptionError)
            }
            ReceptionState::ReceptionAddressed { index } => {
                if self.staged.is_checksum_correct() {
                    self.delivered = Some(Delivered {
                        index,
                        telegram: self.staged.clone(),
                    });
                    Some(CouplerEvent::TelegramReceived)
                } else {
                    Some(CouplerEvent::ReceptionError)
                }
            }
            _ => None,
        };

        self.state = ReceptionState::IdleWaitingForControlField;
        event
    }

    /// Deliver a complete telegram handed over by the transport
    ///
    /// Telegrams not addressed to an attached object, or with a wrong checksum, are dropped
    /// without any event or state change. Nothing is delivered before init.
    pub fn deliver(&mut self, telegram: &T, index: &ComObjectIndex) -> Option<CouplerEvent> {
        if matches!(self.state, ReceptionState::Reset | ReceptionState::Init) {
            debug!("Delivery ignored in state {:?}", self.state);
            return None;
        }
        let obj_index = index.find(telegram.target_address())?;
        if !telegram.is_checksum_correct() {
            return None;
        }
        self.delivered = Some(Delivered {
            index: obj_index,
            telegram: telegram.clone(),
        });
        self.state = ReceptionState::IdleWaitingForControlField;
        Some(CouplerEvent::TelegramReceived)
    }

    /// Deliver the staged telegram, if it is addressed to us and complete
    ///
    /// This is the push mode counterpart of [`poll_eop`](Self::poll_eop), for transports which
    /// fill the staged telegram and know by themselves when it is complete. Nothing happens until
    /// the staged telegram has a valid checksum.
    pub fn deliver_staged(&mut self) -> Option<CouplerEvent> {
        let ReceptionState::ReceptionAddressed { index } = self.state else {
            return None;
        };
        if !self.staged.is_checksum_correct() {
            return None;
        }
        self.delivered = Some(Delivered {
            index,
            telegram: self.staged.clone(),
        });
        self.state = ReceptionState::IdleWaitingForControlField;
        Some(CouplerEvent::TelegramReceived)
    }

    /// The last telegram delivered to the application
    pub fn received_telegram(&self) -> Option<&T> {
        self.delivered.as_ref().map(|d| &d.telegram)
    }

    /// The position of the object targeted by the last delivered telegram
    pub fn addressed_index(&self) -> Option<u8> {
        self.delivered.as_ref().map(|d| d.index)
    }
}
