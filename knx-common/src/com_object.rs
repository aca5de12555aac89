//! A minimal communication object descriptor
//!
//! Applications usually have their own object type carrying a value, and only need to implement
//! [`ComObject`] for it. This descriptor holds the addressing part only.

use crate::traits::ComObject;

/// Indicator flags of a communication object
pub mod indicators {
    /// Communication: the object is linked to the bus
    pub const C: u8 = 0x20;
    /// Read: the object value can be read from the bus
    pub const R: u8 = 0x10;
    /// Write: the object value can be written from the bus
    pub const W: u8 = 0x08;
    /// Transmit: the object value is sent on change
    pub const T: u8 = 0x04;
    /// Update: responses to read requests update the value
    pub const U: u8 = 0x02;
    /// Init: the value is read from the bus at startup
    pub const I: u8 = 0x01;
}

/// Address and indicator flags of a communication object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ComObjectDescriptor {
    /// Raw group address
    pub address: u16,
    /// Combination of the [`indicators`] flags
    pub indicator: u8,
}

impl ComObjectDescriptor {
    /// Create a descriptor
    pub const fn new(address: u16, indicator: u8) -> Self {
        Self { address, indicator }
    }

    /// Create a descriptor for an object linked to the bus, with the C, W and T flags set
    pub const fn linked(address: u16) -> Self {
        Self::new(address, indicators::C | indicators::W | indicators::T)
    }

    /// Create a descriptor for an object which is not linked to the bus
    pub const fn unlinked(address: u16) -> Self {
        Self::new(address, indicators::R | indicators::W)
    }
}

impl ComObject for ComObjectDescriptor {
    fn address(&self) -> u16 {
        self.address
    }

    fn is_communication_enabled(&self) -> bool {
        self.indicator & indicators::C != 0
    }
}
