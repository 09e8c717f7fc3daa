//! Remote resource client for the compliance REST API.
//!
//! Loaders only see the [`ResourceClient`] trait, so the view logic can be
//! driven against an in-memory backend in tests and against [`HttpClient`]
//! in the binary. Failures never escape as panics: every outcome is a
//! [`RemoteResult`].
use crate::config::ClientConfig;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

/// Raw outcome of one remote call.
pub type RemoteResult = std::result::Result<Value, RemoteError>;

/// Failure reported by a [`ResourceClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    Status { code: u16, message: String },
    /// The request never produced a usable response (connect, timeout, decode).
    Transport(String),
}

impl RemoteError {
    /// Backend-provided message, if the server produced one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            RemoteError::Status { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Status { code, message } => write!(f, "HTTP {code}: {message}"),
            RemoteError::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

/// Seam between the view logic and the network.
pub trait ResourceClient {
    /// Issue a GET against an absolute API path (e.g. `/api/compliance/policies`).
    fn get(&self, path: &str, query: &[(&str, String)]) -> RemoteResult;

    /// Issue a POST with a JSON body.
    fn post(&self, path: &str, body: &Value) -> RemoteResult;
}

/// Blocking HTTP implementation backed by a shared `ureq` agent.
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpClient {
    /// Build a client from a validated config.
    pub fn new(config: &ClientConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(config.timeout_ms)))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl ResourceClient for HttpClient {
    fn get(&self, path: &str, query: &[(&str, String)]) -> RemoteResult {
        let start = Instant::now();
        let mut request = self.agent.get(&self.url(path));
        for (key, value) in query {
            request = request.query(*key, value);
        }
        let outcome = request.call();
        finish("GET", path, start, outcome)
    }

    fn post(&self, path: &str, body: &Value) -> RemoteResult {
        let start = Instant::now();
        let outcome = self.agent.post(&self.url(path)).send_json(body);
        finish("POST", path, start, outcome)
    }
}

fn finish(
    method: &str,
    path: &str,
    start: Instant,
    outcome: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
) -> RemoteResult {
    let mut response = match outcome {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(
                method,
                path,
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %err,
                "remote call failed"
            );
            return Err(RemoteError::Transport(err.to_string()));
        }
    };
    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|err| RemoteError::Transport(format!("read response body: {err}")))?;
    tracing::debug!(
        method,
        path,
        status = status.as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        response_bytes = text.len(),
        "remote call complete"
    );

    if !status.is_success() {
        let fallback = status.canonical_reason().unwrap_or("request failed");
        return Err(RemoteError::Status {
            code: status.as_u16(),
            message: status_message(&text, fallback),
        });
    }
    decode_body(&text)
}

/// Decode a success body; an empty body is `null`.
pub(crate) fn decode_body(text: &str) -> RemoteResult {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|err| RemoteError::Transport(format!("decode response JSON: {err}")))
}

/// Pull a human message out of an error body.
///
/// FastAPI reports errors as `{"detail": "..."}`; anything else falls back to
/// the raw body, then to the status reason.
pub(crate) fn status_message(text: &str, fallback: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        for key in ["detail", "message", "error"] {
            if let Some(Value::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
