use std::collections::VecDeque;

use knx_common::{
    constants::timing::{RX_TASK_PERIOD_US, TX_TASK_PERIOD_US},
    telegram::{length_from_routing_byte, MAX_TELEGRAM_LENGTH},
    ComObject, KnxTelegram, Telegram,
};
use knx_coupler::{BusCoupler, ReceptionState};

/// Time to transmit one character at 19200 baud
pub const CHAR_TIME_US: u32 = 580;

/// Step of the simulation clock
const TICK_US: u32 = 100;

/// Byte level receive side of a TP-UART chip
///
/// Decodes the raw frame bytes and drives the reception hooks of the coupler, the way a UART
/// interrupt handler would.
#[derive(Debug, Default)]
pub struct SimTransport {
    frame: Vec<u8>,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one byte read from the chip
    pub fn receive_byte<O: ComObject>(
        &mut self,
        coupler: &mut BusCoupler<KnxTelegram, O>,
        byte: u8,
        now_us: u32,
    ) {
        coupler.monitor_byte(byte, now_us);

        if coupler.rx_state() == ReceptionState::IdleWaitingForControlField {
            self.frame.clear();
            coupler.start_reception(now_us);
        } else {
            coupler.byte_received(now_us);
        }
        if !coupler.rx_state().is_receiving() {
            return;
        }
        self.frame.push(byte);

        match self.frame.len() {
            // Target address complete
            5 => {
                let telegram = coupler.staged_telegram_mut();
                telegram.set_source_address(u16::from_be_bytes([self.frame[1], self.frame[2]]));
                telegram.set_target_address(u16::from_be_bytes([self.frame[3], self.frame[4]]));
                coupler.resolve_target(now_us);
            }
            n if n > 5 => {
                let expected = length_from_routing_byte(self.frame[5]);
                if n == expected {
                    match KnxTelegram::try_from(self.frame.as_slice()) {
                        Ok(telegram) => *coupler.staged_telegram_mut() = telegram,
                        Err(_) => coupler.length_invalid(now_us),
                    }
                } else if n > expected || n > MAX_TELEGRAM_LENGTH {
                    coupler.length_invalid(now_us);
                }
            }
            _ => (),
        }
    }
}

/// A simulated bus, with a clock and a queue of bytes to be received
///
/// The periodic tasks of the coupler are called at their recommended rates as time advances.
#[derive(Debug, Default)]
pub struct SimBus {
    now_us: u32,
    incoming: VecDeque<(u32, u8)>,
    transport: SimTransport,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus whose clock starts at `now_us`
    pub fn starting_at(now_us: u32) -> Self {
        Self {
            now_us,
            ..Default::default()
        }
    }

    pub fn now_us(&self) -> u32 {
        self.now_us
    }

    /// Queue bytes to be received back to back, starting after `delay_us`
    pub fn queue_bytes(&mut self, bytes: &[u8], delay_us: u32) {
        let mut at = self
            .incoming
            .back()
            .map(|(t, _)| *t)
            .unwrap_or(self.now_us)
            .wrapping_add(delay_us);
        for &b in bytes {
            at = at.wrapping_add(CHAR_TIME_US);
            self.incoming.push_back((at, b));
        }
    }

    /// Queue a telegram to be received after `delay_us`
    pub fn queue_telegram(&mut self, telegram: &KnxTelegram, delay_us: u32) {
        self.queue_bytes(telegram.as_bytes(), delay_us);
    }

    /// Advance the clock by `duration_us`, delivering due bytes and running the coupler tasks
    pub fn run_for<O: ComObject>(
        &mut self,
        coupler: &mut BusCoupler<KnxTelegram, O>,
        duration_us: u32,
    ) {
        let mut elapsed = 0;
        while elapsed < duration_us {
            self.now_us = self.now_us.wrapping_add(TICK_US);
            elapsed += TICK_US;

            while let Some(&(at, byte)) = self.incoming.front() {
                // Wrapping comparison: due if `at` is not in the future
                if self.now_us.wrapping_sub(at) > u32::MAX / 2 {
                    break;
                }
                self.incoming.pop_front();
                self.transport.receive_byte(coupler, byte, at);
            }

            if elapsed % RX_TASK_PERIOD_US == 0 {
                coupler.receive_task(self.now_us);
            }
            if elapsed % TX_TASK_PERIOD_US == 0 {
                coupler.transmit_task(self.now_us);
            }
        }
    }

    /// Run until every queued byte was received and the bus was silent long enough to end the
    /// last telegram
    pub fn run_until_idle<O: ComObject>(&mut self, coupler: &mut BusCoupler<KnxTelegram, O>) {
        while !self.incoming.is_empty() {
            self.run_for(coupler, 1000);
        }
        self.run_for(coupler, 4000);
    }
}

/// Build a group telegram with a valid checksum
pub fn group_telegram(source: u16, target: u16, payload: &[u8]) -> KnxTelegram {
    let mut telegram = KnxTelegram::new();
    telegram.set_source_address(source);
    telegram.set_target_address(target);
    telegram.set_group_addressed(true);
    telegram
        .set_payload(payload)
        .expect("Payload does not fit a standard frame");
    telegram.update_checksum();
    telegram
}
