//! Reader-to-backend reporter.
//!
//! One synchronous `POST` per tag, no retries.  Anything short of a 2xx
//! with a JSON body comes back as an [`Error`], which the reader node turns
//! into a deny.

use log::{info, warn};

use crate::app::decision::AccessDecision;
use crate::app::ports::{BackendPort, HttpError};
use crate::app::tag::TagIdentifier;
use crate::config::BackendConfig;
use crate::error::{Error, Result};

pub struct Reporter {
    endpoint_url: String,
    timeout_ms: u32,
}

impl Reporter {
    pub fn new(backend: &BackendConfig) -> Self {
        Self {
            endpoint_url: backend.endpoint_url(),
            timeout_ms: backend.timeout_ms,
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// `{"rfid_data":"<HEX>"}`
    pub fn request_body(tag: &TagIdentifier) -> String {
        serde_json::json!({ "rfid_data": tag.to_hex().as_str() }).to_string()
    }

    pub fn decide(&self, tag: &TagIdentifier, backend: &mut impl BackendPort) -> Result<AccessDecision> {
        let body = Self::request_body(tag);
        info!("HTTP: POST {} {}", self.endpoint_url, body);

        let response = backend
            .post_json(&self.endpoint_url, body.as_bytes(), self.timeout_ms)
            .map_err(|e| {
                warn!("HTTP: request failed: {}", e);
                Error::from(e)
            })?;

        info!("HTTP: response code {}", response.status);
        if !response.is_success() {
            warn!("HTTP: non-success status {}", response.status);
            return Err(HttpError::Status(response.status).into());
        }

        let decision = AccessDecision::from_json(&response.body).map_err(|e| {
            warn!("HTTP: {}: {}", e, String::from_utf8_lossy(&response.body));
            e
        })?;
        info!(
            "HTTP: success={} status={} message='{}' time_log={}",
            decision.success,
            decision.status,
            decision.message,
            decision.time_log.as_deref().unwrap_or("-")
        );
        Ok(decision)
    }
}
