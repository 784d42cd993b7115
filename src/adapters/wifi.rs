//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`]: one blocking association attempt per
//! call, plus live link status.  Candidate ordering and retry budgets live
//! in [`NetworkBootstrapper`](crate::app::network::NetworkBootstrapper).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: a simulated radio with a configurable set of
//!   in-range access points, for host-side tests.

use log::{info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort, LinkInfo};
use crate::config::{NetworkCredential, validate_password, validate_ssid};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    /// SSID of the last successful association.
    ssid: String,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    /// Simulation: access points currently reachable.
    #[cfg(not(target_os = "espidf"))]
    in_range: Vec<NetworkCredential>,
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self {
            ssid: String::new(),
            wifi,
        }
    }

    fn platform_associate(&mut self, cred: &NetworkCredential) -> Result<(), ConnectivityError> {
        let auth_method = if cred.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: cred
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: cred
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let fail = |stage: &str, e: esp_idf_svc::sys::EspError| {
            warn!("WiFi(espidf): {} failed for '{}': {}", stage, cred.ssid, e);
            ConnectivityError::AssociationFailed
        };

        if self.wifi.is_connected().unwrap_or(false) {
            let _ = self.wifi.disconnect();
        }
        self.wifi
            .set_configuration(&conf)
            .map_err(|e| fail("set_configuration", e))?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|e| fail("start", e))?;
        }
        self.wifi.connect().map_err(|e| fail("connect", e))?;
        self.wifi.wait_netif_up().map_err(|e| fail("netif up", e))?;
        Ok(())
    }

    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn platform_ip(&self) -> [u8; 4] {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map(|info| info.ip.octets())
            .unwrap_or([0; 4])
    }

    fn platform_rssi(&self) -> Option<i8> {
        use esp_idf_svc::sys::{esp, esp_wifi_sta_get_ap_info, wifi_ap_record_t};

        let mut ap: wifi_ap_record_t = Default::default();
        // SAFETY: `ap` is a valid out-pointer for the duration of the call.
        esp!(unsafe { esp_wifi_sta_get_ap_info(&mut ap) })
            .ok()
            .map(|()| ap.rssi)
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    /// Simulated radio that can see `in_range`.
    pub fn simulated(in_range: Vec<NetworkCredential>) -> Self {
        Self {
            ssid: String::new(),
            in_range,
            sim_connected: false,
        }
    }

    /// Simulation: replace the set of reachable access points.  Dropping the
    /// current one also drops the link.
    pub fn set_in_range(&mut self, in_range: Vec<NetworkCredential>) {
        self.in_range = in_range;
        if !self.in_range.iter().any(|ap| ap.ssid == self.ssid) {
            self.sim_connected = false;
        }
    }

    fn platform_associate(&mut self, cred: &NetworkCredential) -> Result<(), ConnectivityError> {
        let reachable = self.in_range.iter().any(|ap| ap == cred);
        if !reachable {
            return Err(ConnectivityError::AssociationFailed);
        }
        self.sim_connected = true;
        Ok(())
    }

    fn platform_is_connected(&self) -> bool {
        self.sim_connected
    }

    fn platform_ip(&self) -> [u8; 4] {
        [192, 168, 1, 50]
    }

    fn platform_rssi(&self) -> Option<i8> {
        // Weaker for networks further down the list.
        let pos = self.in_range.iter().position(|ap| ap.ssid == self.ssid)?;
        Some(-48_i8.saturating_sub(i8::try_from(pos * 6).unwrap_or(i8::MAX)))
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn associate(&mut self, cred: &NetworkCredential) -> Result<(), ConnectivityError> {
        validate_ssid(&cred.ssid)?;
        validate_password(&cred.password)?;

        info!("WiFi: trying '{}'", cred.ssid);
        self.platform_associate(cred)?;
        self.ssid.clone_from(&cred.ssid);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn link_info(&self) -> Option<LinkInfo> {
        if !self.platform_is_connected() {
            return None;
        }
        Some(LinkInfo {
            ssid: self.ssid.clone(),
            ip: self.platform_ip(),
            rssi: self.platform_rssi(),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
