//! In-memory compliance backend.
//!
//! Serves canned responses keyed by request line (`GET /path?key=value`) and
//! records every request it sees. The CLI uses it for offline `--fixture`
//! files; tests use it to script backend behavior.
use crate::client::{RemoteError, RemoteResult, ResourceClient};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Scripted [`ResourceClient`] backed by a route table.
#[derive(Debug, Default)]
pub struct MemoryClient {
    routes: RefCell<BTreeMap<String, RemoteResult>>,
    requests: RefCell<Vec<String>>,
    posted: RefCell<Vec<Value>>,
}

impl MemoryClient {
    /// Create an empty backend; unknown routes answer 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file mapping request lines to JSON bodies.
    pub fn from_fixture(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read fixture {}", path.display()))?;
        let value: Value = serde_json::from_slice(&bytes).context("parse fixture JSON")?;
        let Value::Object(entries) = value else {
            return Err(anyhow!("fixture must be a JSON object keyed by request line"));
        };
        let client = Self::new();
        for (line, body) in entries {
            if !(line.starts_with("GET ") || line.starts_with("POST ")) {
                return Err(anyhow!(
                    "fixture keys must start with \"GET \" or \"POST \" (got {line:?})"
                ));
            }
            client.routes.borrow_mut().insert(line, Ok(body));
        }
        Ok(client)
    }

    /// Answer `line` with `body` from now on.
    pub fn respond(&self, line: &str, body: Value) {
        self.routes.borrow_mut().insert(line.to_string(), Ok(body));
    }

    /// Answer `line` with a failure from now on.
    pub fn fail(&self, line: &str, err: RemoteError) {
        self.routes.borrow_mut().insert(line.to_string(), Err(err));
    }

    /// Request lines received so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// JSON bodies received by POST requests, in order.
    pub fn posted_bodies(&self) -> Vec<Value> {
        self.posted.borrow().clone()
    }

    /// Number of requests received for `line`.
    pub fn count(&self, line: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|seen| seen.as_str() == line)
            .count()
    }

    fn answer(&self, line: String) -> RemoteResult {
        let outcome = self
            .routes
            .borrow()
            .get(&line)
            .cloned()
            .unwrap_or_else(|| {
                Err(RemoteError::Status {
                    code: 404,
                    message: "Not Found".to_string(),
                })
            });
        self.requests.borrow_mut().push(line);
        outcome
    }
}

/// Render a request as the route-table key.
pub fn request_line(method: &str, path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return format!("{method} {path}");
    }
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!("{method} {path}?{}", pairs.join("&"))
}

impl ResourceClient for MemoryClient {
    fn get(&self, path: &str, query: &[(&str, String)]) -> RemoteResult {
        self.answer(request_line("GET", path, query))
    }

    fn post(&self, path: &str, body: &Value) -> RemoteResult {
        self.posted.borrow_mut().push(body.clone());
        self.answer(request_line("POST", path, &[]))
    }
}
