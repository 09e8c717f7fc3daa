//! Shared test infrastructure for integration tests.
//!
//! `FakeCompliance` behaves like the compliance backend rather than replaying
//! canned responses: it filters results server-side, orders runs newest
//! first, and creates a run on every trigger.

use policyview::{RemoteError, RemoteResult, ResourceClient};
use serde_json::{json, Value};
use std::cell::RefCell;

/// One stored run with its result rows.
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub id: String,
    pub started_at: String,
    pub results: Vec<(String, bool)>,
}

/// In-memory compliance backend with one policy.
#[derive(Debug)]
pub struct FakeCompliance {
    pub policy_id: String,
    runs: RefCell<Vec<StoredRun>>,
    trigger_results: RefCell<Vec<(String, bool)>>,
    log: RefCell<Vec<String>>,
}

#[allow(dead_code)]
impl FakeCompliance {
    pub fn new(policy_id: &str) -> Self {
        Self {
            policy_id: policy_id.to_string(),
            runs: RefCell::new(Vec::new()),
            trigger_results: RefCell::new(Vec::new()),
            log: RefCell::new(Vec::new()),
        }
    }

    /// Store a run; runs are served newest first by `started_at`.
    pub fn with_run(self, id: &str, started_at: &str, results: &[(&str, bool)]) -> Self {
        self.runs.borrow_mut().push(StoredRun {
            id: id.to_string(),
            started_at: started_at.to_string(),
            results: results
                .iter()
                .map(|(object, passed)| (object.to_string(), *passed))
                .collect(),
        });
        self
    }

    /// Results attached to runs created by the next trigger.
    pub fn on_trigger(self, results: &[(&str, bool)]) -> Self {
        *self.trigger_results.borrow_mut() = results
            .iter()
            .map(|(object, passed)| (object.to_string(), *passed))
            .collect();
        self
    }

    /// Requests seen so far as `METHOD path[?query]`.
    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn run_json(&self, run: &StoredRun) -> Value {
        let failures = run.results.iter().filter(|(_, passed)| !passed).count();
        let total = run.results.len();
        let score = if total == 0 {
            100.0
        } else {
            100.0 * (total - failures) as f64 / total as f64
        };
        json!({
            "id": run.id,
            "policy_id": self.policy_id,
            "status": "succeeded",
            "started_at": run.started_at,
            "finished_at": run.started_at,
            "success_count": total - failures,
            "failure_count": failures,
            "score": score
        })
    }

    fn list_runs(&self) -> Value {
        let mut runs = self.runs.borrow().clone();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Value::Array(runs.iter().map(|run| self.run_json(run)).collect())
    }

    fn list_results(&self, run_id: &str, only_failed: bool) -> RemoteResult {
        let runs = self.runs.borrow();
        let Some(run) = runs.iter().find(|run| run.id == run_id) else {
            return Err(RemoteError::Status {
                code: 404,
                message: "Run not found".to_string(),
            });
        };
        let rows: Vec<Value> = run
            .results
            .iter()
            .filter(|(_, passed)| !only_failed || !passed)
            .enumerate()
            .map(|(index, (object, passed))| {
                json!({
                    "id": format!("{run_id}-{index}"),
                    "run_id": run_id,
                    "object_type": "table",
                    "object_id": object,
                    "passed": passed
                })
            })
            .collect();
        Ok(json!({ "results": rows }))
    }
}

impl ResourceClient for FakeCompliance {
    fn get(&self, path: &str, query: &[(&str, String)]) -> RemoteResult {
        let only_failed = query
            .iter()
            .any(|(key, value)| *key == "only_failed" && value == "true");
        let line = if query.is_empty() {
            format!("GET {path}")
        } else {
            format!("GET {path}?only_failed={only_failed}")
        };
        self.log.borrow_mut().push(line);

        let policy_path = format!("/api/compliance/policies/{}", self.policy_id);
        if path == policy_path {
            return Ok(json!({
                "id": self.policy_id,
                "name": "Tables have owners",
                "description": "Every table declares an owner",
                "rule": "ASSERT obj.owner != ''",
                "category": "governance",
                "severity": "high",
                "is_active": true
            }));
        }
        if path == format!("{policy_path}/runs") {
            return Ok(self.list_runs());
        }
        if let Some(run_id) = path
            .strip_prefix("/api/compliance/runs/")
            .and_then(|rest| rest.strip_suffix("/results"))
        {
            return self.list_results(run_id, only_failed);
        }
        Err(RemoteError::Status {
            code: 404,
            message: "Not Found".to_string(),
        })
    }

    fn post(&self, path: &str, body: &Value) -> RemoteResult {
        self.log.borrow_mut().push(format!("POST {path}"));
        if path != format!("/api/compliance/policies/{}/runs", self.policy_id) {
            return Err(RemoteError::Status {
                code: 404,
                message: "Not Found".to_string(),
            });
        }
        if body["mode"] != "inline" {
            return Err(RemoteError::Status {
                code: 422,
                message: "mode must be inline".to_string(),
            });
        }
        let next = self.runs.borrow().len() + 1;
        let run = StoredRun {
            id: format!("r{next}"),
            started_at: format!("2024-{next:02}-01"),
            results: self.trigger_results.borrow().clone(),
        };
        let created = self.run_json(&run);
        self.runs.borrow_mut().push(run);
        Ok(created)
    }
}
