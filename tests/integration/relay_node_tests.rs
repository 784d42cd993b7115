//! Relay node: bus payload → relay pulse.

use rfidgate::adapters::http::HttpBackend;
use rfidgate::adapters::mqtt::MqttAdapter;
use rfidgate::adapters::rfid::SimTagReader;
use rfidgate::adapters::wifi::WifiAdapter;
use rfidgate::app::commands::Command;
use rfidgate::app::events::{NodeEvent, NodeRole};
use rfidgate::app::service::{ReaderNodeService, RelayNodeService, TickOutcome};
use rfidgate::drivers::relay::RelayLevel;

use crate::mock_net::{FakeClock, MockDelay, MockPin, RecordingSink, home, node_config};

type Relay = RelayNodeService<WifiAdapter, MqttAdapter, MockPin, MockDelay>;

fn started() -> (Relay, FakeClock, RecordingSink) {
    let cfg = node_config("ESP32_Relay");
    let mut svc = RelayNodeService::new(
        &cfg,
        WifiAdapter::simulated(vec![home()]),
        MqttAdapter::loopback(),
        "ESP32_Relay_EFCAFE".into(),
        MockPin::default(),
        MockDelay::default(),
    );
    let mut clock = FakeClock::default();
    let mut sink = RecordingSink::default();
    svc.start(&mut clock, &mut sink);
    sink.clear();
    (svc, clock, sink)
}

fn deliver(svc: &mut Relay, clock: &mut FakeClock, sink: &mut RecordingSink, payloads: &[&[u8]]) -> TickOutcome {
    for p in payloads {
        svc.bus_mut().bus_mut().inject("RFID_LOGIN", p);
    }
    svc.tick(clock, sink)
}

fn writes_after_init(svc: &Relay) -> usize {
    svc.relay().pin().writes.len() - 1
}

#[test]
fn start_parks_relay_released_before_networking() {
    let cfg = node_config("ESP32_Relay");
    let mut svc: Relay = RelayNodeService::new(
        &cfg,
        WifiAdapter::simulated(vec![home()]),
        MqttAdapter::loopback(),
        "ESP32_Relay_EFCAFE".into(),
        MockPin::default(),
        MockDelay::default(),
    );
    let mut clock = FakeClock::default();
    let mut sink = RecordingSink::default();
    svc.start(&mut clock, &mut sink);

    assert_eq!(svc.relay().pin().writes, vec![true]);
    assert_eq!(svc.relay_mut().level(), Ok(RelayLevel::Released));
    assert!(matches!(sink.events.first(), Some(NodeEvent::LinkUp(_))));
    assert_eq!(sink.events.last(), Some(&NodeEvent::Ready(NodeRole::Relay)));
}

#[test]
fn one_unlocks_zero_locks() {
    let (mut svc, mut clock, mut sink) = started();

    assert_eq!(deliver(&mut svc, &mut clock, &mut sink, &[b"1"]), TickOutcome::Dispatched(1));
    assert_eq!(svc.relay_mut().level(), Ok(RelayLevel::Energized));

    deliver(&mut svc, &mut clock, &mut sink, &[b"0"]);
    assert_eq!(svc.relay_mut().level(), Ok(RelayLevel::Released));

    assert_eq!(
        sink.events,
        vec![
            NodeEvent::RelayDriven { command: Command::RelayOn, level: RelayLevel::Energized },
            NodeEvent::RelayDriven { command: Command::RelayOff, level: RelayLevel::Released },
        ]
    );
}

#[test]
fn unknown_payloads_never_touch_the_pin() {
    let (mut svc, mut clock, mut sink) = started();
    deliver(&mut svc, &mut clock, &mut sink, &[b"2", b"ON", b"", b"01", b"1 "]);

    assert_eq!(writes_after_init(&svc), 0);
    assert_eq!(sink.count(|e| matches!(e, NodeEvent::CommandIgnored { .. })), 5);
}

#[test]
fn repeated_command_pulses_every_time() {
    let (mut svc, mut clock, mut sink) = started();
    deliver(&mut svc, &mut clock, &mut sink, &[b"1", b"1"]);
    assert_eq!(writes_after_init(&svc), 14);
}

#[test]
fn queued_messages_apply_in_order() {
    let (mut svc, mut clock, mut sink) = started();
    assert_eq!(
        deliver(&mut svc, &mut clock, &mut sink, &[b"1", b"0"]),
        TickOutcome::Dispatched(2)
    );
    assert_eq!(svc.relay_mut().level(), Ok(RelayLevel::Released));
}

#[test]
fn quiet_tick_sleeps_ten_ms() {
    let (mut svc, mut clock, mut sink) = started();
    assert_eq!(svc.tick(&mut clock, &mut sink), TickOutcome::Idle);
    assert_eq!(clock.sleeps, vec![10]);
}

#[test]
fn reader_decision_drives_relay() {
    let cfg = node_config("ESP32_RFID");
    let mut reader = ReaderNodeService::new(
        &cfg,
        WifiAdapter::simulated(vec![home()]),
        MqttAdapter::loopback(),
        "ESP32_RFID_EFCAFE".into(),
        HttpBackend::simulated("ESP32-RFID-Client", &[("0AFF", 0)]),
        SimTagReader::new(),
    );
    let mut clock = FakeClock::default();
    let mut sink = RecordingSink::default();
    reader.start(&mut clock, &mut sink);
    let (mut relay, mut relay_clock, mut relay_sink) = started();

    for expected in [RelayLevel::Energized, RelayLevel::Released] {
        reader.reader_mut().present(&[0x0A, 0xFF]);
        reader.tick(&mut clock, &mut sink);

        // Stand-in for the broker between the two boards.
        let msg = reader.bus().bus().published().last().cloned().unwrap();
        deliver(&mut relay, &mut relay_clock, &mut relay_sink, &[msg.payload.as_slice()]);
        assert_eq!(relay.relay_mut().level(), Ok(expected));
    }
}
