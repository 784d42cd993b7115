//! Access decisions returned by the backend.
//!
//! Field lookup is lenient: each field falls back to its default when it is
//! missing or has the wrong JSON type, so only a body that is not JSON at all
//! counts as malformed.  The backend names two fields differently from the
//! firmware contract (`found`, `time_logged`); both spellings are accepted.

use serde_json::Value;

use crate::error::Error;

/// Payload published when no trustworthy decision exists.
pub const DENY_PAYLOAD: &str = "0";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the tag is registered.
    pub success: bool,
    /// Status the relay node should apply (1 = unlock, 0 = lock).
    pub status: i32,
    pub message: String,
    pub time_log: Option<String>,
}

impl AccessDecision {
    /// Decode a response body.  [`Error::MalformedResponse`] if it is not JSON.
    pub fn from_json(body: &[u8]) -> Result<Self, Error> {
        let doc: Value = serde_json::from_slice(body).map_err(|_| Error::MalformedResponse)?;

        let field = |primary: &str, alias: &str| doc.get(primary).or_else(|| doc.get(alias));

        Ok(Self {
            success: field("success", "found").and_then(Value::as_bool).unwrap_or(false),
            status: doc
                .get("status")
                .and_then(Value::as_i64)
                .and_then(|v| i32::try_from(v).ok())
                .unwrap_or(0),
            message: doc
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            time_log: field("time_log", "time_logged")
                .and_then(Value::as_str)
                .map(str::to_owned),
        })
    }

    /// Bus payload: the status as a decimal string, whatever `success` says.
    pub fn payload(&self) -> String {
        self.status.to_string()
    }
}

/// Bus payload for the outcome of one report; any failure denies.
pub fn payload_for(outcome: &Result<AccessDecision, Error>) -> String {
    match outcome {
        Ok(decision) => decision.payload(),
        Err(_) => DENY_PAYLOAD.to_owned(),
    }
}
