//! HTTP backend adapter.
//!
//! Implements [`BackendPort`]: one blocking `POST` with a JSON body.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` wrapped in the
//!   `embedded_svc` HTTP client.  A fresh connection per request; the
//!   reader posts at most once per cooldown.
//! - **all other targets**: an in-process tag registry that answers the
//!   way the access-control backend does (registered tags toggle 0↔1).

use log::debug;

use crate::app::ports::{BackendPort, HttpError, HttpResponse};

/// Largest response body kept; the backend's replies are ~200 bytes.
const MAX_BODY_LEN: usize = 2048;

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use std::time::Duration;

    use embedded_svc::http::Method;
    use embedded_svc::http::client::Client as HttpClient;
    use embedded_svc::io::{Read, Write};
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use esp_idf_svc::io::EspIOError;
    use esp_idf_svc::sys::{ESP_ERR_HTTP_EAGAIN, ESP_ERR_TIMEOUT};

    use super::MAX_BODY_LEN;
    use crate::app::ports::{HttpError, HttpResponse};

    pub struct HttpBackend {
        user_agent: String,
    }

    fn classify(e: EspIOError) -> HttpError {
        let code = e.0.code();
        if code == ESP_ERR_TIMEOUT as i32 || code == ESP_ERR_HTTP_EAGAIN as i32 {
            HttpError::Timeout
        } else {
            HttpError::Transport(code)
        }
    }

    impl HttpBackend {
        pub fn new(user_agent: &str) -> Self {
            Self {
                user_agent: user_agent.into(),
            }
        }

        pub(super) fn platform_post(
            &mut self,
            url: &str,
            body: &[u8],
            timeout_ms: u32,
        ) -> Result<HttpResponse, HttpError> {
            let conn = EspHttpConnection::new(&Configuration {
                timeout: Some(Duration::from_millis(u64::from(timeout_ms))),
                ..Default::default()
            })
            .map_err(|e| HttpError::Transport(e.code()))?;
            let mut client = HttpClient::wrap(conn);

            let content_length = body.len().to_string();
            let headers = [
                ("Content-Type", "application/json"),
                ("Content-Length", content_length.as_str()),
                ("User-Agent", self.user_agent.as_str()),
            ];
            let mut request = client.request(Method::Post, url, &headers).map_err(classify)?;
            request.write_all(body).map_err(classify)?;
            request.flush().map_err(classify)?;

            let mut response = request.submit().map_err(classify)?;
            let status = response.status();

            let mut out = Vec::new();
            let mut buf = [0u8; 256];
            loop {
                let n = response.read(&mut buf).map_err(classify)?;
                if n == 0 {
                    break;
                }
                if out.len() + n > MAX_BODY_LEN {
                    return Err(HttpError::BodyTooLarge);
                }
                out.extend_from_slice(&buf[..n]);
            }
            Ok(HttpResponse { status, body: out })
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host backend: simulated tag registry
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use std::collections::HashMap;

    use serde_json::{Value, json};

    use super::MAX_BODY_LEN;
    use crate::app::ports::{HttpError, HttpResponse};

    /// `ECONNREFUSED`-style code reported while the server is "down".
    const SIM_CONNECT_REFUSED: i32 = -1;

    pub struct HttpBackend {
        user_agent: String,
        /// Registered tags and their current status.
        registry: HashMap<String, i64>,
        /// Append-only scan log: (tag, status written).
        log: Vec<(String, i64)>,
        reachable: bool,
    }

    impl HttpBackend {
        pub fn simulated(user_agent: &str, registered: &[(&str, i64)]) -> Self {
            Self {
                user_agent: user_agent.into(),
                registry: registered.iter().map(|(t, s)| ((*t).to_owned(), *s)).collect(),
                log: Vec::new(),
                reachable: true,
            }
        }

        /// Simulation: make every request fail at the transport level.
        pub fn set_reachable(&mut self, reachable: bool) {
            self.reachable = reachable;
        }

        pub fn status_of(&self, tag: &str) -> Option<i64> {
            self.registry.get(tag).copied()
        }

        pub fn scan_log(&self) -> &[(String, i64)] {
            &self.log
        }

        pub fn user_agent(&self) -> &str {
            &self.user_agent
        }

        pub(super) fn platform_post(
            &mut self,
            _url: &str,
            body: &[u8],
            _timeout_ms: u32,
        ) -> Result<HttpResponse, HttpError> {
            if !self.reachable {
                return Err(HttpError::Transport(SIM_CONNECT_REFUSED));
            }

            let tag = serde_json::from_slice::<Value>(body)
                .ok()
                .and_then(|v| v.get("rfid_data").and_then(Value::as_str).map(str::trim).map(str::to_owned))
                .unwrap_or_default();

            let time_logged = format!("2024-01-01 00:00:{:02}", self.log.len() % 60);
            let reply = if tag.is_empty() {
                json!({ "error": "No RFID data provided" })
            } else if let Some(status) = self.registry.get_mut(&tag) {
                let current = *status;
                *status = if current != 0 { 0 } else { 1 };
                self.log.push((tag.clone(), *status));
                json!({
                    "found": true,
                    "rfid_data": tag,
                    "current_status": current,
                    "status": *status,
                    "message": "RFID found and status updated",
                    "time_logged": time_logged,
                })
            } else {
                self.log.push((tag.clone(), 0));
                json!({
                    "found": false,
                    "rfid_data": tag,
                    "status": 0,
                    "message": "RFID NOT FOUND",
                    "time_logged": time_logged,
                })
            };

            let body = reply.to_string().into_bytes();
            if body.len() > MAX_BODY_LEN {
                return Err(HttpError::BodyTooLarge);
            }
            Ok(HttpResponse { status: 200, body })
        }
    }
}

pub use platform::HttpBackend;

impl BackendPort for HttpBackend {
    fn post_json(&mut self, url: &str, body: &[u8], timeout_ms: u32) -> Result<HttpResponse, HttpError> {
        let response = self.platform_post(url, body, timeout_ms)?;
        debug!("HTTP: {} bytes, status {}", response.body.len(), response.status);
        Ok(response)
    }
}
