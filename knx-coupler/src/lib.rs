//! A library to drive a UART based KNX bus coupler chip in Rust
//!
//! knx-coupler sits between an application and the byte level transport of a KNX TP coupler chip.
//! It is primarily intended to be run on microcontrollers, and so it is no_std compatible and
//! performs no heap allocation. It provides the following features:
//!
//! * Keeps an ordered *index* of the communication objects of the device, so that the target
//!   address of every received telegram can be matched quickly.
//! * Implements the *reception* state machine: end of packet detection by bus silence, checksum
//!   validation, and delivery of the telegrams addressed to the device.
//! * Implements the *transmission* state machine: handoff of sent telegrams with the source
//!   address forced to the physical address of the device, and optional acknowledgment tracking
//!   with timeout.
//! * Captures raw bus traffic in *bus monitor* mode.
//!
//! The representation of telegrams and communication objects belongs to the application, through
//! the [`Telegram`](common::Telegram) and [`ComObject`](common::ComObject) traits. A standard frame
//! [`KnxTelegram`](common::KnxTelegram) and a [`ComObjectDescriptor`](common::ComObjectDescriptor)
//! are provided.
//!
//! # Getting Started
//!
//! ## Creating the [`BusCoupler`]
//!
//! The coupler borrows its callbacks and the list of communication objects, which must therefore
//! outlive it. The list is attached between the reset and the init of the coupler.
//!
//! ```rust
//! use core::cell::Cell;
//! use knx_coupler::{BusCoupler, CouplerConfig};
//! use knx_coupler::common::{
//!     ComObjectDescriptor, CouplerEvent, IndividualAddress, KnxTelegram, TransmitError,
//! };
//!
//! let objects = [ComObjectDescriptor::linked(0x0A03)];
//! let transmit = |_telegram: &KnxTelegram| -> Result<(), TransmitError> {
//!     // Write the telegram bytes to the UART here
//!     Ok(())
//! };
//! let received = Cell::new(0);
//! let on_event = |event: CouplerEvent| {
//!     if event == CouplerEvent::TelegramReceived {
//!         received.set(received.get() + 1);
//!     }
//! };
//!
//! let config = CouplerConfig::new(IndividualAddress::new(1, 1, 5).unwrap());
//! let mut coupler: BusCoupler<KnxTelegram, ComObjectDescriptor> =
//!     BusCoupler::new(config, &transmit);
//! coupler.set_event_callback(&on_event);
//! coupler.reset();
//! coupler.attach_com_objects(&objects).unwrap();
//! coupler.init();
//! assert_eq!(Some(0), coupler.is_address_assigned(0x0A03));
//! ```
//!
//! ## Handling received bytes
//!
//! The application reads bytes from the chip. When the control field of a telegram arrives,
//! [`BusCoupler::start_reception`] is called, the telegram is then filled in through
//! [`BusCoupler::staged_telegram_mut`], with [`BusCoupler::byte_received`] called for every
//! byte. Once the target address is complete, [`BusCoupler::resolve_target`] checks it against
//! the attached objects, so the transport knows whether the telegram has to be acknowledged.
//!
//! The end of the telegram is detected by [`BusCoupler::receive_task`], which must be called at
//! least every 0.5ms. Alternatively, transports which assemble complete telegrams by themselves
//! hand them over with [`BusCoupler::deliver_telegram`].
//!
//! ## Sending
//!
//! Telegrams are sent with [`BusCoupler::send`]. With the default
//! [`TransmitStrategy::Synchronous`], the transmit function is called right away. With
//! [`TransmitStrategy::Buffered`], [`BusCoupler::transmit_task`] must be called around every
//! 0.8ms, and the outcome is reported to the acknowledgment callback.
#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod bus_monitor;
mod com_object_index;
mod coupler;
mod error;
pub mod receiver;
pub mod transmitter;

// Re-export types used in the public API
pub use knx_common as common;

pub use bus_monitor::{MonitorData, MONITOR_BUFFER_SIZE};
pub use com_object_index::{ComObjectIndex, MAX_COM_OBJECTS};
pub use coupler::{AckCallback, BusCoupler, CouplerConfig, EventCallback, TransmitFn};
pub use error::CouplerError;
pub use receiver::ReceptionState;
pub use transmitter::{TransmissionState, TransmitStrategy};
