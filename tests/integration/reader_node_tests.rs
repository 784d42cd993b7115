//! Reader node: card → backend → published decision.

use rfidgate::adapters::http::HttpBackend;
use rfidgate::adapters::mqtt::MqttAdapter;
use rfidgate::adapters::rfid::SimTagReader;
use rfidgate::adapters::wifi::WifiAdapter;
use rfidgate::app::events::{NodeEvent, NodeRole};
use rfidgate::app::ports::{BackendPort, BusMessage, HttpError};
use rfidgate::app::service::{ReaderNodeService, TickOutcome};
use rfidgate::error::Error;

use crate::mock_net::{FakeClock, RecordingSink, ScriptedBackend, home, node_config};

type Reader<H> = ReaderNodeService<WifiAdapter, MqttAdapter, H, SimTagReader>;

const CLIENT_ID: &str = "ESP32_RFID_EFCAFE";

fn started<H: BackendPort>(backend: H) -> (Reader<H>, FakeClock, RecordingSink) {
    let cfg = node_config("ESP32_RFID");
    let mut svc = ReaderNodeService::new(
        &cfg,
        WifiAdapter::simulated(vec![home()]),
        MqttAdapter::loopback(),
        CLIENT_ID.into(),
        backend,
        SimTagReader::new(),
    );
    let mut clock = FakeClock::default();
    let mut sink = RecordingSink::default();
    svc.start(&mut clock, &mut sink);
    (svc, clock, sink)
}

fn registry(tags: &[(&str, i64)]) -> HttpBackend {
    HttpBackend::simulated("ESP32-RFID-Client", tags)
}

fn published<H: BackendPort>(svc: &Reader<H>) -> Vec<String> {
    svc.bus().bus().published().iter().map(BusMessage::payload_text).collect()
}

fn scan<H: BackendPort>(
    svc: &mut Reader<H>,
    clock: &mut FakeClock,
    sink: &mut RecordingSink,
    uid: &[u8],
) -> TickOutcome {
    svc.reader_mut().present(uid);
    svc.tick(clock, sink)
}

#[test]
fn start_brings_up_link_and_session() {
    let (svc, clock, sink) = started(registry(&[]));

    assert!(svc.network().is_connected());
    assert_eq!(svc.bus().bus().session_id(), Some(CLIENT_ID));
    assert!(clock.sleeps.is_empty(), "nothing to wait for on a healthy network");
    assert!(matches!(sink.events.first(), Some(NodeEvent::LinkUp(l)) if l.ssid == "Home"));
    assert_eq!(sink.events.last(), Some(&NodeEvent::Ready(NodeRole::Reader)));
}

#[test]
fn registered_tag_alternates_unlock_and_lock() {
    let (mut svc, mut clock, mut sink) = started(registry(&[("0AFF", 0)]));

    let first = scan(&mut svc, &mut clock, &mut sink, &[0x0A, 0xFF]);
    assert_eq!(
        first,
        TickOutcome::TagHandled {
            tag: "0AFF".try_into().unwrap(),
            published: Some("1".into()),
        }
    );
    scan(&mut svc, &mut clock, &mut sink, &[0x0A, 0xFF]);

    assert_eq!(published(&svc), vec!["1", "0"]);
    assert!(svc.bus().bus().published().iter().all(|m| m.topic == "RFID_LOGIN"));
    assert_eq!(svc.reader_mut().halts(), 2);
}

#[test]
fn unknown_tag_publishes_deny() {
    let (mut svc, mut clock, mut sink) = started(registry(&[("0AFF", 0)]));
    scan(&mut svc, &mut clock, &mut sink, &[0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(published(&svc), vec!["0"]);
    assert_eq!(svc.backend_mut().scan_log(), &[("DEADBEEF".to_string(), 0)]);
}

#[test]
fn every_read_is_followed_by_cooldown() {
    let (mut svc, mut clock, mut sink) = started(registry(&[]));
    scan(&mut svc, &mut clock, &mut sink, &[1, 2, 3, 4]);
    assert_eq!(clock.sleeps, vec![2_000]);
}

#[test]
fn idle_tick_sleeps_briefly() {
    let (mut svc, mut clock, mut sink) = started(registry(&[]));
    assert_eq!(svc.tick(&mut clock, &mut sink), TickOutcome::Idle);
    assert_eq!(clock.sleeps, vec![100]);
    assert!(published(&svc).is_empty());
}

#[test]
fn backend_timeout_publishes_deny() {
    let (mut svc, mut clock, mut sink) = started(ScriptedBackend::failing(HttpError::Timeout));
    scan(&mut svc, &mut clock, &mut sink, &[0x0A, 0xFF]);

    assert_eq!(published(&svc), vec!["0"]);
    assert_eq!(svc.backend_mut().requests, 1, "no HTTP retry");
    assert!(sink
        .events
        .contains(&NodeEvent::Fault(Error::HttpFailure(HttpError::Timeout))));
}

#[test]
fn server_error_publishes_deny_even_with_status_in_body() {
    let (mut svc, mut clock, mut sink) =
        started(ScriptedBackend::status(503, r#"{"success":true,"status":1}"#));
    scan(&mut svc, &mut clock, &mut sink, &[0x0A, 0xFF]);
    assert_eq!(published(&svc), vec!["0"]);
}

#[test]
fn response_without_status_publishes_deny() {
    let (mut svc, mut clock, mut sink) =
        started(ScriptedBackend::status(200, r#"{"success":true,"message":"welcome"}"#));
    scan(&mut svc, &mut clock, &mut sink, &[0x0A, 0xFF]);
    assert_eq!(published(&svc), vec!["0"]);
}

#[test]
fn status_is_published_verbatim_regardless_of_success() {
    let (mut svc, mut clock, mut sink) =
        started(ScriptedBackend::status(200, r#"{"success":false,"status":7}"#));
    scan(&mut svc, &mut clock, &mut sink, &[0x0A, 0xFF]);
    assert_eq!(published(&svc), vec!["7"]);
}

#[test]
fn html_error_page_publishes_deny() {
    let (mut svc, mut clock, mut sink) =
        started(ScriptedBackend::status(200, "<br /><b>Fatal error</b>"));
    scan(&mut svc, &mut clock, &mut sink, &[0x0A, 0xFF]);
    assert_eq!(published(&svc), vec!["0"]);
    assert!(sink.events.contains(&NodeEvent::Fault(Error::MalformedResponse)));
}

#[test]
fn tag_read_while_offline_is_not_reported() {
    let (mut svc, mut clock, mut sink) = started(registry(&[("0AFF", 0)]));
    svc.network_mut().wifi_mut().set_in_range(Vec::new());
    sink.clear();

    let outcome = scan(&mut svc, &mut clock, &mut sink, &[0x0A, 0xFF]);

    assert_eq!(
        outcome,
        TickOutcome::TagHandled {
            tag: "0AFF".try_into().unwrap(),
            published: None,
        }
    );
    assert!(published(&svc).is_empty());
    assert!(svc.backend_mut().scan_log().is_empty());
    assert!(sink.events.contains(&NodeEvent::Fault(Error::NetworkUnavailable)));
    assert_eq!(clock.sleeps.last(), Some(&2_000), "cooldown still applies");
    assert_eq!(svc.reader_mut().halts(), 1);
}
