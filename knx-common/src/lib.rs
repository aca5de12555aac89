//! Common types shared by the KNX coupler and its transports.
//!
//! Most users will have no reason to depend on this crate directly, as it is re-exported by
//! `knx-coupler`.
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs, missing_copy_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod addressing;
pub mod com_object;
pub mod constants;
pub mod events;
pub mod telegram;
pub mod traits;

pub use addressing::{GroupAddress, IndividualAddress};
pub use com_object::ComObjectDescriptor;
pub use events::{AckStatus, CouplerEvent, CouplerMode};
pub use telegram::{KnxTelegram, TelegramError};
pub use traits::{ComObject, Telegram, TransmitError};
