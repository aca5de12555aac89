//! Common traits
//!
//! The coupler does not own the representation of telegrams or communication objects. Anything
//! implementing these traits can be attached to and exchanged through it.

/// Error returned by a transmit function, containing its numeric result code
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmitError(pub u8);

impl core::fmt::Display for TransmitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Failed to transmit telegram, result code {}", self.0)
    }
}

impl core::error::Error for TransmitError {}

/// A framed bus message
///
/// The coupler only reads the addressing fields and the checksum. Copying a telegram is done
/// through `Clone`, so implementations are expected to be cheap, fixed size buffers.
pub trait Telegram: Clone {
    /// Raw individual address of the sender
    fn source_address(&self) -> u16;
    /// Overwrite the sender address. The checksum is not updated.
    fn set_source_address(&mut self, addr: u16);
    /// Raw target address (group or individual)
    fn target_address(&self) -> u16;
    /// Recompute the checksum after the telegram was modified
    fn update_checksum(&mut self);
    /// Check that the stored checksum matches the telegram content
    fn is_checksum_correct(&self) -> bool;
    /// Total length of the telegram on the wire, in bytes
    fn length(&self) -> usize;
}

/// An addressable data point of the local device
pub trait ComObject {
    /// Raw group address the object listens to
    fn address(&self) -> u16;
    /// True when the object takes part in bus communication
    fn is_communication_enabled(&self) -> bool;
}

impl<C: ComObject + ?Sized> ComObject for &C {
    fn address(&self) -> u16 {
        (**self).address()
    }

    fn is_communication_enabled(&self) -> bool {
        (**self).is_communication_enabled()
    }
}
