//! Network bootstrapper: multi-network Wi-Fi association.
//!
//! Walks an ordered credential list until one network associates.  The
//! link is modelled as a small state machine advanced by [`poll`]:
//!
//! ```text
//!  Disconnected ──poll──▶ Connecting ──round ok──▶ Connected
//!        ▲                    │ round failed            │
//!        │                    └──────(stays)            │ driver reports loss
//!        └──────────────────────────────────────────────┘
//! ```
//!
//! [`connect`] and [`maintain`] are the two blocking loops built on top of
//! it: the first is unbounded (boot), the second spends at most a fixed
//! budget (main loop).  All sleeping goes through [`TimePort`].
//!
//! [`poll`]: NetworkBootstrapper::poll
//! [`connect`]: NetworkBootstrapper::connect
//! [`maintain`]: NetworkBootstrapper::maintain

use log::{debug, info, warn};

use crate::app::events::NodeEvent;
use crate::app::ports::{ConnectivityPort, EventSink, LinkInfo, TimePort};
use crate::config::NetworkCredential;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Result of one [`NetworkBootstrapper::maintain`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The link never dropped.
    AlreadyUp,
    /// The link dropped and came back within the budget.
    Restored,
    /// The budget ran out; the caller carries on offline.
    Failed,
}

pub struct NetworkBootstrapper<W> {
    wifi: W,
    networks: Vec<NetworkCredential>,
    state: ConnectionState,
}

impl<W: ConnectivityPort> NetworkBootstrapper<W> {
    pub fn new(wifi: W, networks: Vec<NetworkCredential>) -> Self {
        for cred in &networks {
            info!("WiFi: added network '{}'", cred.ssid);
        }
        Self {
            wifi,
            networks,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Live driver status.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected()
    }

    pub fn wifi(&self) -> &W {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut W {
        &mut self.wifi
    }

    /// Advance the state machine by one step.  While not connected this
    /// runs exactly one association round over the credential list.
    pub fn poll(&mut self) -> ConnectionState {
        match self.refresh() {
            ConnectionState::Connected => {}
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                self.state = ConnectionState::Connecting;
                if self.associate_round() {
                    self.state = ConnectionState::Connected;
                }
            }
        }
        self.state
    }

    /// Block until a network associates, polling every `poll_ms`.  There
    /// is no upper bound: the node is inert without connectivity.
    pub fn connect(
        &mut self,
        poll_ms: u32,
        time: &mut impl TimePort,
        sink: &mut impl EventSink,
    ) -> LinkInfo {
        info!("WiFi: connecting");
        let mut rounds: u32 = 0;
        loop {
            if self.poll() == ConnectionState::Connected {
                let link = self.current_link();
                info!("WiFi: connected to {} after {} round(s)", link, rounds + 1);
                sink.emit(&NodeEvent::LinkUp(link.clone()));
                return link;
            }
            rounds = rounds.saturating_add(1);
            debug!("WiFi: no network associated (round {})", rounds);
            time.sleep_ms(poll_ms);
        }
    }

    /// Called every loop tick.  If the link is down, retry association for
    /// at most `budget_ms` (sleeping `retry_ms` between rounds) and report
    /// what happened.  Never blocks past the budget plus one round.
    pub fn maintain(
        &mut self,
        budget_ms: u32,
        retry_ms: u32,
        time: &mut impl TimePort,
        sink: &mut impl EventSink,
    ) -> LinkOutcome {
        if self.refresh() == ConnectionState::Connected {
            return LinkOutcome::AlreadyUp;
        }

        warn!("WiFi: connection lost, reconnecting (budget {} ms)", budget_ms);
        sink.emit(&NodeEvent::LinkLost);

        let deadline = time.now_ms() + u64::from(budget_ms);
        loop {
            if self.poll() == ConnectionState::Connected {
                let link = self.current_link();
                info!("WiFi: reconnected to {}", link);
                sink.emit(&NodeEvent::LinkUp(link));
                return LinkOutcome::Restored;
            }
            if time.now_ms() + u64::from(retry_ms) > deadline {
                break;
            }
            time.sleep_ms(retry_ms);
        }

        warn!("WiFi: failed to reconnect within {} ms", budget_ms);
        sink.emit(&NodeEvent::LinkRestoreFailed { budget_ms });
        LinkOutcome::Failed
    }

    /// Fold the driver's live status into the cached state.
    fn refresh(&mut self) -> ConnectionState {
        if self.state == ConnectionState::Connected && !self.wifi.is_connected() {
            self.state = ConnectionState::Disconnected;
        }
        self.state
    }

    /// Try each credential in order; stop at the first that associates.
    fn associate_round(&mut self) -> bool {
        for cred in &self.networks {
            match self.wifi.associate(cred) {
                Ok(()) => return true,
                Err(e) => debug!("WiFi: '{}' did not associate: {}", cred.ssid, e),
            }
        }
        false
    }

    fn current_link(&self) -> LinkInfo {
        self.wifi.link_info().unwrap_or_else(|| LinkInfo {
            ssid: String::new(),
            ip: [0; 4],
            rssi: None,
        })
    }
}
