//! The bus coupler
//!
//! [`BusCoupler`] owns the reception and transmission state machines, the index of the attached
//! communication objects, and the callbacks through which the application is notified.

use defmt_or_log::{debug, info, warn};
use knx_common::{
    AckStatus, ComObject, CouplerEvent, CouplerMode, IndividualAddress, Telegram, TransmitError,
};

use crate::{
    bus_monitor::{BusMonitor, MonitorData},
    com_object_index::ComObjectIndex,
    error::{CouplerError, NotInitStateSnafu},
    receiver::{ReceptionState, TelegramReceiver},
    transmitter::{TelegramTransmitter, TransmissionState, TransmitStrategy},
};

/// Function handing a telegram to the bus
pub type TransmitFn<'a, T> = &'a dyn Fn(&T) -> Result<(), TransmitError>;
/// Callback notified of reception events
pub type EventCallback<'a> = &'a dyn Fn(CouplerEvent);
/// Callback notified of the outcome of buffered transmissions
pub type AckCallback<'a> = &'a dyn Fn(AckStatus);

/// Static configuration of a coupler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CouplerConfig {
    /// Individual address of the device, used as source of every sent telegram
    pub physical_address: IndividualAddress,
    /// Operating mode
    pub mode: CouplerMode,
    /// How sent telegrams are handed to the transmit function
    pub transmit_strategy: TransmitStrategy,
}

impl CouplerConfig {
    /// Create a config for the given physical address, with default mode and strategy
    pub const fn new(physical_address: IndividualAddress) -> Self {
        Self {
            physical_address,
            mode: CouplerMode::Normal,
            transmit_strategy: TransmitStrategy::Synchronous,
        }
    }

    /// Set the operating mode
    pub const fn with_mode(mut self, mode: CouplerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the transmit strategy
    pub const fn with_transmit_strategy(mut self, strategy: TransmitStrategy) -> Self {
        self.transmit_strategy = strategy;
        self
    }
}

/// Coupler between the application and a UART bus coupler chip
///
/// # Lifecycle
///
/// 1. [`reset`](Self::reset) puts both state machines in their init state
/// 2. [`attach_com_objects`](Self::attach_com_objects) registers the objects of the device
/// 3. [`init`](Self::init) starts operation
/// 4. [`receive_task`](Self::receive_task) and [`transmit_task`](Self::transmit_task) are called
///    periodically, while the transport feeds the reception hooks
#[allow(missing_debug_implementations)]
pub struct BusCoupler<'a, T, O> {
    config: CouplerConfig,
    objects: &'a [O],
    index: ComObjectIndex,
    rx: TelegramReceiver<T>,
    tx: TelegramTransmitter<T>,
    monitor: BusMonitor,
    transmit_fn: TransmitFn<'a, T>,
    event_cb: Option<EventCallback<'a>>,
    ack_cb: Option<AckCallback<'a>>,
}

impl<'a, T: Telegram + Default, O: ComObject> BusCoupler<'a, T, O> {
    /// Create a coupler
    ///
    /// `transmit_fn` is called with every telegram to put on the bus.
    pub fn new(config: CouplerConfig, transmit_fn: TransmitFn<'a, T>) -> Self {
        Self {
            config,
            objects: &[],
            index: ComObjectIndex::new(),
            rx: TelegramReceiver::new(),
            tx: TelegramTransmitter::new(config.physical_address.raw(), config.transmit_strategy),
            monitor: BusMonitor::new(),
            transmit_fn,
            event_cb: None,
            ack_cb: None,
        }
    }

    /// Register the callback notified of received telegrams and reception errors
    pub fn set_event_callback(&mut self, callback: EventCallback<'a>) {
        self.event_cb = Some(callback);
    }

    /// Register the callback notified of the outcome of buffered transmissions
    pub fn set_ack_callback(&mut self, callback: AckCallback<'a>) {
        self.ack_cb = Some(callback);
    }

    /// Put both state machines in their init state, dropping any telegram in flight
    pub fn reset(&mut self) {
        self.rx.reset();
        self.tx.reset();
        self.monitor.clear();
        debug!("Coupler reset");
    }

    /// Attach the list of communication objects of the device
    ///
    /// Replaces any previously attached list. Only allowed between [`reset`](Self::reset) and
    /// [`init`](Self::init), otherwise `NotInitState` is returned and the current list stays
    /// attached.
    pub fn attach_com_objects(&mut self, objects: &'a [O]) -> Result<(), CouplerError> {
        if self.rx.state() != ReceptionState::Init || self.tx.state() != TransmissionState::Init {
            return NotInitStateSnafu.fail();
        }
        self.index = ComObjectIndex::build(objects);
        self.objects = objects;
        info!(
            "Attached {} communication objects, {} assigned",
            objects.len(),
            self.index.len()
        );
        Ok(())
    }

    /// Start operation. Must be called after every reset.
    pub fn init(&mut self) {
        self.rx.init();
        self.tx.init();
        debug!("Coupler initialized");
    }

    /// Send a telegram
    ///
    /// The source address of the telegram is set to the physical address of the device, and its
    /// checksum updated accordingly, before it is handed over. With the synchronous strategy, the
    /// result of the transmit function is returned.
    pub fn send(&mut self, telegram: &mut T) -> Result<(), CouplerError> {
        self.tx.send(telegram, self.transmit_fn)
    }

    /// Reception task, for transports relying on silence to detect the end of telegrams
    ///
    /// Must be called at least every 0.5ms, 0.4ms is typical. `now_us` is a free running, wrapping
    /// microsecond counter.
    pub fn receive_task(&mut self, now_us: u32) {
        if let Some(event) = self.rx.poll_eop(now_us) {
            self.emit(event);
        }
    }

    /// Deliver a complete telegram received by the transport
    ///
    /// Telegrams that are not addressed to an attached object or have a wrong checksum are
    /// silently dropped.
    pub fn deliver_telegram(&mut self, telegram: &T) {
        if let Some(event) = self.rx.deliver(telegram, &self.index) {
            self.emit(event);
        }
    }

    /// Deliver the staged telegram once it is complete, for transports filling it in place
    pub fn deliver_staged(&mut self) {
        if let Some(event) = self.rx.deliver_staged() {
            self.emit(event);
        }
    }

    /// Transmission task
    ///
    /// Progresses buffered transmissions and tracks acknowledgment timeouts. Should be called
    /// around every 0.8ms.
    pub fn transmit_task(&mut self, now_us: u32) {
        if let Some(status) = self.tx.transmit_task(now_us, self.rx.state(), self.transmit_fn) {
            self.report_ack(status);
        }
    }

    /// The control field of a new telegram was received
    pub fn start_reception(&mut self, now_us: u32) {
        self.rx.start_reception(now_us);
    }

    /// Access the telegram being received, for the transport to fill in
    pub fn staged_telegram_mut(&mut self) -> &mut T {
        self.rx.staged_telegram_mut()
    }

    /// A byte of the telegram being received arrived
    pub fn byte_received(&mut self, now_us: u32) {
        self.rx.byte_received(now_us);
    }

    /// The target address of the staged telegram was received
    pub fn resolve_target(&mut self, now_us: u32) {
        self.rx.resolve_target(&self.index, now_us);
    }

    /// The length field of the telegram being received is invalid
    pub fn length_invalid(&mut self, now_us: u32) {
        self.rx.length_invalid(now_us);
    }

    /// An acknowledgment for the last sent telegram was received
    pub fn acknowledge(&mut self, status: AckStatus) {
        if let Some(status) = self.tx.acknowledge(status) {
            self.report_ack(status);
        }
    }

    /// Capture a raw bus byte. Ignored unless in bus monitor mode.
    pub fn monitor_byte(&mut self, byte: u8, now_us: u32) {
        if self.config.mode == CouplerMode::BusMonitor {
            self.monitor.push(byte, now_us);
        }
    }

    /// Get the oldest captured bus byte, in bus monitor mode
    pub fn monitoring_data(&mut self) -> Option<MonitorData> {
        if self.config.mode != CouplerMode::BusMonitor {
            return None;
        }
        self.monitor.pop()
    }

    /// Find the position in the attached list of the object listening to `addr`
    pub fn is_address_assigned(&self, addr: u16) -> Option<u8> {
        self.index.find(addr)
    }

    /// Number of objects reachable from the bus
    pub fn assigned_count(&self) -> usize {
        self.index.len()
    }

    /// The attached communication objects
    pub fn com_objects(&self) -> &'a [O] {
        self.objects
    }

    /// The last telegram delivered to the application
    pub fn received_telegram(&self) -> Option<&T> {
        self.rx.received_telegram()
    }

    /// Position in the attached list of the object targeted by the last delivered telegram
    pub fn addressed_index(&self) -> Option<u8> {
        self.rx.addressed_index()
    }

    /// The object targeted by the last delivered telegram
    pub fn addressed_com_object(&self) -> Option<&'a O> {
        let objects = self.objects;
        self.rx
            .addressed_index()
            .and_then(|index| objects.get(usize::from(index)))
    }

    /// State of the reception state machine
    pub fn rx_state(&self) -> ReceptionState {
        self.rx.state()
    }

    /// State of the transmission state machine
    pub fn tx_state(&self) -> TransmissionState {
        self.tx.state()
    }

    /// The individual address of the device
    pub fn physical_address(&self) -> IndividualAddress {
        self.config.physical_address
    }

    /// The operating mode
    pub fn mode(&self) -> CouplerMode {
        self.config.mode
    }

    fn emit(&self, event: CouplerEvent) {
        match self.event_cb {
            Some(cb) => cb(event),
            None => warn!("No event callback registered, {:?} dropped", event),
        }
    }

    fn report_ack(&self, status: AckStatus) {
        match self.ack_cb {
            Some(cb) => cb(status),
            None => warn!("No acknowledgment callback registered, {:?} dropped", status),
        }
    }
}
