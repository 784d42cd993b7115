//! Wi-Fi and broker loss while the loop is running.

use rfidgate::adapters::http::HttpBackend;
use rfidgate::adapters::mqtt::MqttAdapter;
use rfidgate::adapters::rfid::SimTagReader;
use rfidgate::adapters::wifi::WifiAdapter;
use rfidgate::app::events::NodeEvent;
use rfidgate::app::network::ConnectionState;
use rfidgate::app::ports::ConnectivityPort;
use rfidgate::app::service::{ReaderNodeService, RelayNodeService, TickOutcome};
use rfidgate::drivers::relay::RelayLevel;
use rfidgate::error::Error;

use crate::mock_net::{FakeClock, MockDelay, MockPin, RecordingSink, backup, home, node_config};

type Reader = ReaderNodeService<WifiAdapter, MqttAdapter, HttpBackend, SimTagReader>;
type Relay = RelayNodeService<WifiAdapter, MqttAdapter, MockPin, MockDelay>;

fn reader(in_range: Vec<rfidgate::config::NetworkCredential>) -> (Reader, FakeClock, RecordingSink) {
    let mut svc = ReaderNodeService::new(
        &node_config("ESP32_RFID"),
        WifiAdapter::simulated(in_range),
        MqttAdapter::loopback(),
        "ESP32_RFID_EFCAFE".into(),
        HttpBackend::simulated("ESP32-RFID-Client", &[("0AFF", 0)]),
        SimTagReader::new(),
    );
    let mut clock = FakeClock::default();
    let mut sink = RecordingSink::default();
    svc.start(&mut clock, &mut sink);
    sink.clear();
    (svc, clock, sink)
}

fn relay() -> (Relay, FakeClock, RecordingSink) {
    let mut svc = RelayNodeService::new(
        &node_config("ESP32_Relay"),
        WifiAdapter::simulated(vec![home(), backup()]),
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

#[test]
fn boot_falls_through_to_second_network() {
    let (svc, clock, _) = reader(vec![backup()]);
    assert_eq!(svc.network().state(), ConnectionState::Connected);
    assert_eq!(
        svc.network().wifi().link_info().map(|l| l.ssid),
        Some("Backup".into())
    );
    assert!(clock.sleeps.is_empty());
}

#[test]
fn lost_link_is_restored_on_backup_and_session_rebuilt() {
    let (mut svc, mut clock, mut sink) = relay();
    svc.network_mut().wifi_mut().set_in_range(vec![backup()]);

    assert_eq!(svc.tick(&mut clock, &mut sink), TickOutcome::Idle);

    assert_eq!(sink.events[0], NodeEvent::LinkLost);
    assert!(matches!(&sink.events[1], NodeEvent::LinkUp(l) if l.ssid == "Backup"));
    assert!(matches!(&sink.events[2], NodeEvent::BusConnected { attempt: 1, .. }));

    // The rebuilt session carries the subscription.
    svc.bus_mut().bus_mut().inject("RFID_LOGIN", b"1");
    svc.tick(&mut clock, &mut sink);
    assert_eq!(svc.relay_mut().level(), Ok(RelayLevel::Energized));
}

#[test]
fn restore_with_broker_down_keeps_looping() {
    let (mut svc, mut clock, mut sink) = relay();
    svc.network_mut().wifi_mut().set_in_range(vec![backup()]);
    svc.bus_mut().bus_mut().set_broker_up(false);

    assert_eq!(svc.tick(&mut clock, &mut sink), TickOutcome::Idle);

    assert_eq!(sink.events[0], NodeEvent::LinkLost);
    assert!(matches!(&sink.events[1], NodeEvent::LinkUp(_)));
    assert_eq!(sink.events[2], NodeEvent::BusUnreachable { attempts: 5 });
    assert_eq!(clock.sleeps, vec![2_000, 2_000, 2_000, 2_000, 10]);
    assert!(!svc.bus().is_connected());
}

#[test]
fn restore_gives_up_at_budget_and_loop_continues() {
    let (mut svc, mut clock, mut sink) = reader(vec![home()]);
    svc.network_mut().wifi_mut().set_in_range(Vec::new());

    assert_eq!(svc.tick(&mut clock, &mut sink), TickOutcome::Idle);

    let wifi_wait: u32 = clock.sleeps.iter().filter(|&&ms| ms == 500).sum();
    assert_eq!(wifi_wait, 10_000);
    assert!(sink
        .events
        .contains(&NodeEvent::LinkRestoreFailed { budget_ms: 10_000 }));
    assert_eq!(clock.sleeps.last(), Some(&100));
}

#[test]
fn broker_outage_is_bounded_per_tick() {
    let (mut svc, mut clock, mut sink) = relay();
    svc.bus_mut().bus_mut().set_broker_up(false);

    assert_eq!(svc.tick(&mut clock, &mut sink), TickOutcome::Idle);
    assert_eq!(clock.sleeps, vec![2_000, 2_000, 2_000, 2_000, 10]);
    assert_eq!(sink.events, vec![NodeEvent::BusUnreachable { attempts: 5 }]);

    svc.bus_mut().bus_mut().set_broker_up(true);
    sink.clear();
    svc.tick(&mut clock, &mut sink);
    assert!(matches!(sink.events.as_slice(), [NodeEvent::BusConnected { attempt: 1, .. }]));
    assert!(svc.bus().is_connected());
}

#[test]
fn decision_is_dropped_when_broker_stays_down() {
    let (mut svc, mut clock, mut sink) = reader(vec![home()]);
    svc.bus_mut().bus_mut().set_broker_up(false);
    svc.reader_mut().present(&[0x0A, 0xFF]);

    let outcome = svc.tick(&mut clock, &mut sink);

    assert!(matches!(outcome, TickOutcome::TagHandled { published: None, .. }));
    // One cycle from upkeep, one from the publish attempt.
    assert_eq!(sink.count(|e| matches!(e, NodeEvent::BusUnreachable { .. })), 2);
    assert!(sink
        .events
        .contains(&NodeEvent::Fault(Error::BusUnreachable { attempts: 5 })));
    assert!(svc.bus().bus().published().is_empty());
    // The backend still saw the scan.
    assert_eq!(svc.backend_mut().status_of("0AFF"), Some(1));
}
