#![allow(dead_code)]
use std::cell::{Cell, RefCell};

use knx_common::{
    AckStatus, ComObjectDescriptor, CouplerEvent, IndividualAddress, KnxTelegram, TransmitError,
};
use knx_coupler::{BusCoupler, CouplerConfig};

pub const PHYSICAL_ADDR: IndividualAddress = IndividualAddress::from_raw(0x1105);
pub const REMOTE_ADDR: u16 = 0x1101;

/// Group addresses of the objects returned by [`device_objects`]
pub const LIGHT_SWITCH: u16 = 0x0A03;
pub const LIGHT_STATUS: u16 = 0x0A04;
pub const DIMMER: u16 = 0x0B01;
pub const UNLINKED: u16 = 0x0C00;

pub fn device_objects() -> [ComObjectDescriptor; 5] {
    [
        ComObjectDescriptor::linked(LIGHT_STATUS),
        ComObjectDescriptor::linked(LIGHT_SWITCH),
        ComObjectDescriptor::unlinked(UNLINKED),
        ComObjectDescriptor::linked(DIMMER),
        // Duplicate of the switch, never addressed
        ComObjectDescriptor::linked(LIGHT_SWITCH),
    ]
}

/// Records everything the coupler reports to the application
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: RefCell<Vec<CouplerEvent>>,
    pub acks: RefCell<Vec<AckStatus>>,
    pub sent: RefCell<Vec<KnxTelegram>>,
    /// Error returned by the transmit function, it succeeds when `None`
    pub transmit_error: Cell<Option<TransmitError>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transmit(&self, telegram: &KnxTelegram) -> Result<(), TransmitError> {
        self.sent.borrow_mut().push(*telegram);
        match self.transmit_error.get() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn on_event(&self, event: CouplerEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn on_ack(&self, status: AckStatus) {
        self.acks.borrow_mut().push(status);
    }

    pub fn take_events(&self) -> Vec<CouplerEvent> {
        self.events.take()
    }
}

/// Create a coupler, attach `objects` and initialize it
///
/// The closures wiring the recorder must outlive the coupler, so they are passed in by the
/// caller.
pub fn setup_coupler<'a>(
    config: CouplerConfig,
    objects: &'a [ComObjectDescriptor],
    transmit: &'a dyn Fn(&KnxTelegram) -> Result<(), TransmitError>,
    on_event: &'a dyn Fn(CouplerEvent),
    on_ack: &'a dyn Fn(AckStatus),
) -> BusCoupler<'a, KnxTelegram, ComObjectDescriptor> {
    // Show the coupler logs when run with RUST_LOG set
    let _ = env_logger::builder().is_test(true).try_init();

    let mut coupler = BusCoupler::new(config, transmit);
    coupler.set_event_callback(on_event);
    coupler.set_ack_callback(on_ack);
    coupler.reset();
    coupler.attach_com_objects(objects).unwrap();
    coupler.init();
    coupler
}
