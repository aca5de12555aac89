//! A KNX TP standard frame
//!
//! Layout of the frame on the wire:
//!
//! | byte | content |
//! |------|---------|
//! | 0 | control field |
//! | 1-2 | source address |
//! | 3-4 | target address |
//! | 5 | address type (bit 7), routing counter (bits 6-4), payload length - 1 (bits 3-0) |
//! | 6.. | payload |
//! | last | checksum |
//!
//! The checksum is the bitwise NOT of the XOR of every preceding byte. The payload content is not
//! interpreted here.

use snafu::Snafu;

use crate::traits::Telegram;

/// Number of bytes before the payload
pub const HEADER_SIZE: usize = 6;
/// Largest payload of a standard frame
pub const MAX_PAYLOAD_SIZE: usize = 16;
/// Shortest possible telegram: header, one payload byte and the checksum
pub const MIN_TELEGRAM_LENGTH: usize = HEADER_SIZE + 2;
/// Longest possible standard telegram
pub const MAX_TELEGRAM_LENGTH: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + 1;

/// Control field of a standard frame, low priority, not repeated
pub const CONTROL_FIELD_DEFAULT: u8 = 0xBC;
/// Group addressed, routing counter 6, 2 payload bytes
pub const ROUTING_FIELD_DEFAULT: u8 = 0xE1;

const ROUTING_BYTE: usize = 5;
const GROUP_ADDRESS_FLAG: u8 = 0x80;

/// Errors when building a telegram from raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelegramError {
    /// The number of bytes does not match the length declared in the header
    #[snafu(display("Invalid telegram length: {length}"))]
    InvalidLength {
        /// The length that was provided
        length: usize,
    },
    /// The payload is empty or does not fit in a standard frame
    #[snafu(display("Payload of {length} bytes does not fit a standard frame"))]
    InvalidPayloadLength {
        /// The length that was provided
        length: usize,
    },
}

/// Compute the full telegram length from the routing byte (byte 5) of the header
pub const fn length_from_routing_byte(routing: u8) -> usize {
    HEADER_SIZE + (routing & 0x0F) as usize + 2
}

/// A standard frame telegram stored in a fixed size buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KnxTelegram {
    buf: [u8; MAX_TELEGRAM_LENGTH],
}

impl Default for KnxTelegram {
    fn default() -> Self {
        Self::new()
    }
}

impl KnxTelegram {
    /// Create a telegram with default control and routing fields, zero addresses and payload, and
    /// a valid checksum
    pub const fn new() -> Self {
        let mut buf = [0u8; MAX_TELEGRAM_LENGTH];
        buf[0] = CONTROL_FIELD_DEFAULT;
        buf[ROUTING_BYTE] = ROUTING_FIELD_DEFAULT;
        let mut telegram = Self { buf };
        let checksum_index = telegram.checksum_index();
        telegram.buf[checksum_index] = telegram.compute_checksum();
        telegram
    }

    /// Access the bytes of the telegram, checksum included
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.length()]
    }

    /// Get the control field
    pub fn control_field(&self) -> u8 {
        self.buf[0]
    }

    /// Set the control field
    pub fn set_control_field(&mut self, value: u8) {
        self.buf[0] = value;
    }

    /// Set the raw target address
    pub fn set_target_address(&mut self, addr: u16) {
        self.buf[3..5].copy_from_slice(&addr.to_be_bytes());
    }

    /// True when the target address is a group address
    pub fn is_group_addressed(&self) -> bool {
        self.buf[ROUTING_BYTE] & GROUP_ADDRESS_FLAG != 0
    }

    /// Select whether the target is a group or an individual address
    pub fn set_group_addressed(&mut self, group: bool) {
        if group {
            self.buf[ROUTING_BYTE] |= GROUP_ADDRESS_FLAG;
        } else {
            self.buf[ROUTING_BYTE] &= !GROUP_ADDRESS_FLAG;
        }
    }

    /// Get the routing counter (0-7)
    pub fn routing_counter(&self) -> u8 {
        (self.buf[ROUTING_BYTE] >> 4) & 0x07
    }

    /// Number of payload bytes
    pub fn payload_length(&self) -> usize {
        (self.buf[ROUTING_BYTE] & 0x0F) as usize + 1
    }

    /// Access the payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.buf[HEADER_SIZE..HEADER_SIZE + self.payload_length()]
    }

    /// Replace the payload. The checksum is not updated.
    pub fn set_payload(&mut self, payload: &[u8]) -> Result<(), TelegramError> {
        if payload.is_empty() || payload.len() > MAX_PAYLOAD_SIZE {
            return InvalidPayloadLengthSnafu {
                length: payload.len(),
            }
            .fail();
        }
        self.buf[ROUTING_BYTE] = (self.buf[ROUTING_BYTE] & 0xF0) | (payload.len() - 1) as u8;
        self.buf[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(payload);
        // Clear the previous checksum position and anything beyond, so equality only depends on
        // the telegram content
        self.buf[HEADER_SIZE + payload.len()..].fill(0);
        Ok(())
    }

    /// The checksum stored in the telegram
    pub fn checksum(&self) -> u8 {
        self.buf[self.checksum_index()]
    }

    /// Compute the checksum from the telegram content
    pub const fn compute_checksum(&self) -> u8 {
        let mut xor = 0u8;
        let mut i = 0;
        while i < self.checksum_index() {
            xor ^= self.buf[i];
            i += 1;
        }
        !xor
    }

    const fn checksum_index(&self) -> usize {
        length_from_routing_byte(self.buf[ROUTING_BYTE]) - 1
    }
}

impl Telegram for KnxTelegram {
    fn source_address(&self) -> u16 {
        u16::from_be_bytes([self.buf[1], self.buf[2]])
    }

    fn set_source_address(&mut self, addr: u16) {
        self.buf[1..3].copy_from_slice(&addr.to_be_bytes());
    }

    fn target_address(&self) -> u16 {
        u16::from_be_bytes([self.buf[3], self.buf[4]])
    }

    fn update_checksum(&mut self) {
        let index = self.checksum_index();
        self.buf[index] = self.compute_checksum();
    }

    fn is_checksum_correct(&self) -> bool {
        self.checksum() == self.compute_checksum()
    }

    fn length(&self) -> usize {
        length_from_routing_byte(self.buf[ROUTING_BYTE])
    }
}

impl TryFrom<&[u8]> for KnxTelegram {
    type Error = TelegramError;

    /// Build a telegram from the bytes of a complete frame
    ///
    /// The checksum is copied as is, and is not validated.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let length = bytes.len();
        if !(MIN_TELEGRAM_LENGTH..=MAX_TELEGRAM_LENGTH).contains(&length)
            || length_from_routing_byte(bytes[ROUTING_BYTE]) != length
        {
            return InvalidLengthSnafu { length }.fail();
        }
        let mut buf = [0u8; MAX_TELEGRAM_LENGTH];
        buf[..length].copy_from_slice(bytes);
        Ok(Self { buf })
    }
}
