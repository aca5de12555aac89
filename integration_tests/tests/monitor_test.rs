use knx_common::{CouplerEvent, CouplerMode, KnxTelegram};
use knx_coupler::{CouplerConfig, MonitorData, MONITOR_BUFFER_SIZE};

use integration_tests::sim_bus::{group_telegram, SimBus};

mod utils;
use utils::*;

fn monitor_config() -> CouplerConfig {
    CouplerConfig::new(PHYSICAL_ADDR).with_mode(CouplerMode::BusMonitor)
}

#[test]
fn test_monitor_captures_bus_traffic() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(monitor_config(), &objects, &transmit, &on_event, &on_ack);
    let mut bus = SimBus::new();

    let first = group_telegram(REMOTE_ADDR, 0x0001, &[0x00, 0x81]);
    let second = group_telegram(REMOTE_ADDR, LIGHT_SWITCH, &[0x00, 0x80]);
    bus.queue_telegram(&first, 0);
    bus.queue_telegram(&second, 3000);
    bus.run_until_idle(&mut coupler);

    let captured: Vec<MonitorData> = std::iter::from_fn(|| coupler.monitoring_data()).collect();
    let expected: Vec<MonitorData> = [first, second]
        .iter()
        .flat_map(|t| {
            t.as_bytes().iter().enumerate().map(|(i, &byte)| MonitorData {
                byte,
                is_eop: i == 0,
            })
        })
        .collect();
    assert_eq!(expected, captured);

    // Reception goes on as usual
    assert_eq!(vec![CouplerEvent::TelegramReceived], recorder.take_events());
    assert_eq!(Some(&second), coupler.received_telegram());
}

#[test]
fn test_monitor_keeps_newest_bytes() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(monitor_config(), &objects, &transmit, &on_event, &on_ack);
    let mut bus = SimBus::new();

    let bytes: Vec<u8> = (0..40).collect();
    bus.queue_bytes(&bytes, 0);
    bus.run_until_idle(&mut coupler);

    let captured: Vec<u8> = std::iter::from_fn(|| coupler.monitoring_data())
        .map(|d| d.byte)
        .collect();
    assert_eq!(MONITOR_BUFFER_SIZE, captured.len());
    assert_eq!(bytes[bytes.len() - MONITOR_BUFFER_SIZE..], captured[..]);
    assert_eq!(None, coupler.monitoring_data());
}

#[test]
fn test_no_capture_in_normal_mode() {
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

    bus.queue_telegram(&group_telegram(REMOTE_ADDR, DIMMER, &[0x00, 0x81]), 0);
    bus.run_until_idle(&mut coupler);
    assert_eq!(None, coupler.monitoring_data());
    assert_eq!(vec![CouplerEvent::TelegramReceived], recorder.take_events());
}

#[test]
fn test_reset_clears_capture() {
    let recorder = Recorder::new();
    let objects = device_objects();
    let transmit = |t: &KnxTelegram| recorder.transmit(t);
    let on_event = |e: CouplerEvent| recorder.on_event(e);
    let on_ack = |s| recorder.on_ack(s);
    let mut coupler = setup_coupler(monitor_config(), &objects, &transmit, &on_event, &on_ack);
    let mut bus = SimBus::new();

    bus.queue_bytes(&[0xBC, 0x11, 0x01], 0);
    bus.run_until_idle(&mut coupler);
    coupler.reset();
    assert_eq!(None, coupler.monitoring_data());
}
