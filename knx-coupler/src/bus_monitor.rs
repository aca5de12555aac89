//! Capture of raw bus traffic in bus monitor mode

use defmt_or_log::warn;
use knx_common::constants::timing::EOP_TIMEOUT_US;

/// Number of captured bytes kept until the application reads them
pub const MONITOR_BUFFER_SIZE: usize = 32;

/// A byte captured on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorData {
    /// The raw byte
    pub byte: u8,
    /// True if an end of packet preceded this byte, i.e. it is the first byte of a telegram
    pub is_eop: bool,
}

/// A FIFO of captured bytes
#[derive(Debug, Default)]
pub struct BusMonitor {
    buffer: heapless::Deque<MonitorData, MONITOR_BUFFER_SIZE>,
    last_byte_us: Option<u32>,
}

impl BusMonitor {
    /// Create an empty monitor
    pub const fn new() -> Self {
        Self {
            buffer: heapless::Deque::new(),
            last_byte_us: None,
        }
    }

    /// Drop everything captured so far
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_byte_us = None;
    }

    /// Capture a byte. When the buffer is full, the oldest byte is dropped.
    pub fn push(&mut self, byte: u8, now_us: u32) {
        let is_eop = self
            .last_byte_us
            .map_or(true, |last| now_us.wrapping_sub(last) > EOP_TIMEOUT_US);
        self.last_byte_us = Some(now_us);

        if self.buffer.is_full() {
            warn!("Bus monitor buffer overflow, dropping oldest byte");
            self.buffer.pop_front();
        }
        // Cannot fail, there is room after the pop above
        let _ = self.buffer.push_back(MonitorData { byte, is_eop });
    }

    /// Take the oldest captured byte
    pub fn pop(&mut self) -> Option<MonitorData> {
        self.buffer.pop_front()
    }

    /// Number of captured bytes waiting to be read
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if no captured byte is waiting
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
