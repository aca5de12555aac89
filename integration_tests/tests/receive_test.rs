use knx_common::{ComObjectDescriptor, CouplerEvent, KnxTelegram, Telegram};
use knx_coupler::{BusCoupler, CouplerConfig, CouplerError, ReceptionState, TransmissionState};

use integration_tests::sim_bus::{group_telegram, SimBus};

mod utils;
use utils::*;

#[test]
fn test_addressed_telegram_is_delivered() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );
    assert_eq!(3, coupler.assigned_count());

    let mut bus = SimBus::new();
    let telegram = group_telegram(REMOTE_ADDR, LIGHT_SWITCH, &[0x00, 0x81]);
    bus.queue_telegram(&telegram, 0);

    // Still receiving the last bytes: nothing reported yet
    bus.run_for(&mut coupler, 5000);
    assert!(recorder.events.borrow().is_empty());
    assert!(coupler.rx_state().is_receiving());

    bus.run_until_idle(&mut coupler);
    assert_eq!(vec![CouplerEvent::TelegramReceived], recorder.take_events());
    assert_eq!(ReceptionState::IdleWaitingForControlField, coupler.rx_state());
    assert_eq!(Some(&telegram), coupler.received_telegram());
    // The lowest index among duplicates is reported
    assert_eq!(Some(1), coupler.addressed_index());
    assert_eq!(Some(&objects[1]), coupler.addressed_com_object());
}

#[test]
fn test_consecutive_telegrams() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );

    let mut bus = SimBus::new();
    let first = group_telegram(REMOTE_ADDR, DIMMER, &[0x00, 0x80, 0x7F]);
    let ignored = group_telegram(REMOTE_ADDR, 0x0001, &[0x00, 0x81]);
    let unlinked = group_telegram(REMOTE_ADDR, UNLINKED, &[0x00, 0x81]);
    let last = group_telegram(REMOTE_ADDR, LIGHT_STATUS, &[0x00, 0x40]);
    for telegram in [&first, &ignored, &unlinked, &last] {
        bus.queue_telegram(telegram, 3000);
    }

    bus.run_until_idle(&mut coupler);
    assert_eq!(
        vec![CouplerEvent::TelegramReceived, CouplerEvent::TelegramReceived],
        recorder.take_events()
    );
    assert_eq!(Some(&last), coupler.received_telegram());
    assert_eq!(Some(0), coupler.addressed_index());
}

#[test]
fn test_corrupted_telegram_reports_error() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );

    let mut bus = SimBus::new();
    let telegram = group_telegram(REMOTE_ADDR, LIGHT_SWITCH, &[0x00, 0x81]);
    let mut bytes = telegram.as_bytes().to_vec();
    *bytes.last_mut().unwrap() ^= 0x01;
    bus.queue_bytes(&bytes, 0);

    bus.run_until_idle(&mut coupler);
    assert_eq!(vec![CouplerEvent::ReceptionError], recorder.take_events());
    assert_eq!(None, coupler.received_telegram());
    assert_eq!(ReceptionState::IdleWaitingForControlField, coupler.rx_state());
}

#[test]
fn test_incomplete_and_oversized_frames_report_errors() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );
    let mut bus = SimBus::new();

    // Interrupted before the target address is complete
    bus.queue_bytes(&[0xBC, 0x11, 0x01], 0);
    bus.run_until_idle(&mut coupler);
    assert_eq!(vec![CouplerEvent::ReceptionError], recorder.take_events());

    // Interrupted after being addressed to us
    let telegram = group_telegram(REMOTE_ADDR, LIGHT_SWITCH, &[0x00, 0x81]);
    bus.queue_bytes(&telegram.as_bytes()[..7], 0);
    bus.run_until_idle(&mut coupler);
    assert_eq!(vec![CouplerEvent::ReceptionError], recorder.take_events());

    // Longer than declared by the length field
    let mut bytes = telegram.as_bytes().to_vec();
    bytes.extend_from_slice(&[0x00, 0x00]);
    bus.queue_bytes(&bytes, 0);
    bus.run_for(&mut coupler, 580 * bytes.len() as u32 + 100);
    assert_eq!(ReceptionState::ReceptionLengthInvalid, coupler.rx_state());
    bus.run_until_idle(&mut coupler);
    assert_eq!(vec![CouplerEvent::ReceptionError], recorder.take_events());
    assert_eq!(None, coupler.received_telegram());
}

#[test]
fn test_not_addressed_telegram_is_silent() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );

    let mut bus = SimBus::new();
    // A corrupted telegram to somebody else is not our business either
    let mut bytes = group_telegram(REMOTE_ADDR, 0x0001, &[0x00, 0x81])
        .as_bytes()
        .to_vec();
    bytes[7] = 0xFF;
    bus.queue_bytes(&bytes, 0);
    bus.run_for(&mut coupler, 4000);
    assert_eq!(ReceptionState::ReceptionNotAddressed, coupler.rx_state());

    bus.run_until_idle(&mut coupler);
    assert!(recorder.take_events().is_empty());
    assert_eq!(ReceptionState::IdleWaitingForControlField, coupler.rx_state());
}

#[test]
fn test_reception_across_clock_wraparound() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );

    let mut bus = SimBus::starting_at(u32::MAX - 3000);
    let telegram = group_telegram(REMOTE_ADDR, LIGHT_STATUS, &[0x00, 0x81]);
    bus.queue_telegram(&telegram, 0);
    bus.run_until_idle(&mut coupler);

    assert!(bus.now_us() < 100_000);
    assert_eq!(vec![CouplerEvent::TelegramReceived], recorder.take_events());
    assert_eq!(Some(&telegram), coupler.received_telegram());
}

#[test]
fn test_push_delivery() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );

    // Unknown target: no event, no state change
    let unknown = group_telegram(REMOTE_ADDR, 0x0001, &[0x00, 0x81]);
    coupler.deliver_telegram(&unknown);
    assert!(recorder.take_events().is_empty());
    assert_eq!(ReceptionState::IdleWaitingForControlField, coupler.rx_state());
    assert_eq!(None, coupler.received_telegram());

    // Bad checksum: dropped as well
    let mut corrupted = group_telegram(REMOTE_ADDR, DIMMER, &[0x00, 0x81]);
    corrupted.set_source_address(0x1234);
    coupler.deliver_telegram(&corrupted);
    assert!(recorder.take_events().is_empty());
    assert_eq!(None, coupler.received_telegram());

    let telegram = group_telegram(REMOTE_ADDR, DIMMER, &[0x00, 0x81]);
    coupler.deliver_telegram(&telegram);
    assert_eq!(vec![CouplerEvent::TelegramReceived], recorder.take_events());
    assert_eq!(Some(&telegram), coupler.received_telegram());
    assert_eq!(Some(3), coupler.addressed_index());
}

#[test]
fn test_push_staged_delivery() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );

    let telegram = group_telegram(REMOTE_ADDR, LIGHT_SWITCH, &[0x00, 0x81]);
    coupler.start_reception(0);
    coupler.staged_telegram_mut().set_target_address(LIGHT_SWITCH);
    coupler.resolve_target(2000);
    assert_eq!(
        ReceptionState::ReceptionAddressed { index: 1 },
        coupler.rx_state()
    );

    *coupler.staged_telegram_mut() = telegram;
    coupler.deliver_staged();
    assert_eq!(vec![CouplerEvent::TelegramReceived], recorder.take_events());
    assert_eq!(ReceptionState::IdleWaitingForControlField, coupler.rx_state());
}

#[test]
fn test_reset_drops_reception_in_progress() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );

    let mut bus = SimBus::new();
    let telegram = group_telegram(REMOTE_ADDR, LIGHT_SWITCH, &[0x00, 0x81]);
    bus.queue_bytes(&telegram.as_bytes()[..6], 0);
    bus.run_for(&mut coupler, 4000);
    assert_eq!(
        ReceptionState::ReceptionAddressed { index: 1 },
        coupler.rx_state()
    );

    coupler.reset();
    assert_eq!(ReceptionState::Init, coupler.rx_state());
    bus.run_for(&mut coupler, 10_000);
    assert!(recorder.take_events().is_empty());

    coupler.init();
    bus.queue_telegram(&telegram, 0);
    bus.run_until_idle(&mut coupler);
    assert_eq!(vec![CouplerEvent::TelegramReceived], recorder.take_events());
}

#[test]
fn test_push_delivery_before_init_is_ignored() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let mut coupler: BusCoupler<KnxTelegram, ComObjectDescriptor> =
        BusCoupler::new(CouplerConfig::new(PHYSICAL_ADDR), &transmit);
    coupler.set_event_callback(&on_event);

    let telegram = group_telegram(REMOTE_ADDR, LIGHT_SWITCH, &[0x00, 0x81]);
    coupler.deliver_telegram(&telegram);
    assert_eq!(ReceptionState::Reset, coupler.rx_state());

    coupler.reset();
    coupler.attach_com_objects(&objects).unwrap();
    coupler.deliver_telegram(&telegram);
    assert!(recorder.take_events().is_empty());
    assert_eq!(ReceptionState::Init, coupler.rx_state());
    assert_eq!(TransmissionState::Init, coupler.tx_state());
    assert_eq!(None, coupler.received_telegram());

    // Nothing moved the coupler out of its init state
    coupler.attach_com_objects(&objects).unwrap();
    let mut outgoing = group_telegram(REMOTE_ADDR, LIGHT_STATUS, &[0x00, 0x40]);
    assert_eq!(Err(CouplerError::Busy), coupler.send(&mut outgoing));

    coupler.init();
    coupler.send(&mut outgoing).unwrap();
    coupler.deliver_telegram(&telegram);
    assert_eq!(vec![CouplerEvent::TelegramReceived], recorder.take_events());
}

#[test]
fn test_oversized_frame_for_other_device_is_silent() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(
        CouplerConfig::new(PHYSICAL_ADDR),
        &objects,
        &transmit,
        &on_event,
        &on_ack,
    );

    let mut bus = SimBus::new();
    let mut bytes = group_telegram(REMOTE_ADDR, 0x0001, &[0x00, 0x81])
        .as_bytes()
        .to_vec();
    bytes.extend_from_slice(&[0x00, 0x00]);
    bus.queue_bytes(&bytes, 0);
    bus.run_for(&mut coupler, 580 * bytes.len() as u32 + 100);
    assert_eq!(ReceptionState::ReceptionNotAddressed, coupler.rx_state());

    bus.run_until_idle(&mut coupler);
    assert!(recorder.take_events().is_empty());
    assert_eq!(ReceptionState::IdleWaitingForControlField, coupler.rx_state());
}
