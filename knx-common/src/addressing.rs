//! KNX bus addresses
//!
//! Both kinds of address are 16 bit values on the wire. Individual (physical) addresses identify a
//! device and are written `area.line.device`, group addresses identify a function and are written
//! `main/middle/sub`.

use core::fmt;

/// Error returned when an address component is out of range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidAddressError;

impl fmt::Display for InvalidAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address component out of range")
    }
}
impl core::error::Error for InvalidAddressError {}

/// The individual address of a device on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndividualAddress(u16);

impl IndividualAddress {
    /// Create an address from its area (0-15), line (0-15) and device (0-255) components
    pub const fn new(area: u8, line: u8, device: u8) -> Result<Self, InvalidAddressError> {
        if area > 0x0F || line > 0x0F {
            return Err(InvalidAddressError);
        }
        Ok(Self(((area as u16) << 12) | ((line as u16) << 8) | device as u16))
    }

    /// Create an address from its raw 16 bit representation
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Get the raw 16 bit value
    pub const fn raw(&self) -> u16 {
        self.0
    }

    /// The area component
    pub const fn area(&self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// The line component
    pub const fn line(&self) -> u8 {
        ((self.0 >> 8) & 0x0F) as u8
    }

    /// The device component
    pub const fn device(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl From<u16> for IndividualAddress {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<IndividualAddress> for u16 {
    fn from(value: IndividualAddress) -> Self {
        value.raw()
    }
}

impl fmt::Display for IndividualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.area(), self.line(), self.device())
    }
}

/// A 3-level group address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GroupAddress(u16);

impl GroupAddress {
    /// Create an address from its main (0-31), middle (0-7) and sub (0-255) groups
    pub const fn new(main: u8, middle: u8, sub: u8) -> Result<Self, InvalidAddressError> {
        if main > 0x1F || middle > 0x07 {
            return Err(InvalidAddressError);
        }
        Ok(Self(((main as u16) << 11) | ((middle as u16) << 8) | sub as u16))
    }

    /// Create an address from its raw 16 bit representation
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Get the raw 16 bit value
    pub const fn raw(&self) -> u16 {
        self.0
    }

    /// The main group
    pub const fn main(&self) -> u8 {
        (self.0 >> 11) as u8
    }

    /// The middle group
    pub const fn middle(&self) -> u8 {
        ((self.0 >> 8) & 0x07) as u8
    }

    /// The sub group
    pub const fn sub(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl From<u16> for GroupAddress {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<GroupAddress> for u16 {
    fn from(value: GroupAddress) -> Self {
        value.raw()
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}
