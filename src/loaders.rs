//! Loaders for the three dependent compliance resources.
//!
//! The single-entity policy fetch fails loud: a missing or undecodable policy
//! is an error. The list endpoints fail open: a missing or malformed payload is
//! an empty list, because "no runs yet" and "no failing rows" are legitimate
//! states. Transport failures are errors everywhere.
use crate::client::{RemoteError, ResourceClient};
use crate::error::LoadError;
use crate::model::{CheckResult, ComplianceStats, Policy, PolicySummary, Run};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Base path for policy resources.
pub const POLICIES_PATH: &str = "/api/compliance/policies";

const POLICY_NOT_FOUND: &str = "Policy not found";
const POLICY_FALLBACK: &str = "Failed to load policy";
const RUNS_FALLBACK: &str = "Failed to load runs";
const RESULTS_FALLBACK: &str = "Failed to load results";
const TRIGGER_FALLBACK: &str = "Failed to start run";
const POLICIES_FALLBACK: &str = "Failed to load policies";
const STATS_FALLBACK: &str = "Failed to load compliance stats";

/// Path of the aggregate statistics endpoint.
pub const STATS_PATH: &str = "/api/compliance/stats";

/// Execution mode sent with a run trigger; the backend runs checks inline.
pub const RUN_MODE_INLINE: &str = "inline";

/// Return the path of a single policy.
pub fn policy_path(policy_id: &str) -> String {
    format!("{POLICIES_PATH}/{policy_id}")
}

/// Return the path of a policy's run collection.
pub fn runs_path(policy_id: &str) -> String {
    format!("{POLICIES_PATH}/{policy_id}/runs")
}

/// Return the path of a run's result collection.
pub fn results_path(run_id: &str) -> String {
    format!("/api/compliance/runs/{run_id}/results")
}

/// Fetch one policy record.
pub fn load_policy<C: ResourceClient + ?Sized>(
    client: &C,
    policy_id: &str,
) -> Result<Policy, LoadError> {
    let value = match client.get(&policy_path(policy_id), &[]) {
        Ok(value) => value,
        Err(RemoteError::Status { code: 404, message }) => {
            let message = if message.trim().is_empty() {
                POLICY_NOT_FOUND.to_string()
            } else {
                message
            };
            return Err(LoadError::NotFound(message));
        }
        Err(err) => {
            tracing::warn!(policy_id, error = %err, "policy fetch failed");
            return Err(unavailable(&err, POLICY_FALLBACK));
        }
    };
    if value.is_null() {
        return Err(LoadError::NotFound(POLICY_NOT_FOUND.to_string()));
    }
    serde_json::from_value(value).map_err(|err| {
        tracing::warn!(policy_id, error = %err, "policy payload rejected");
        LoadError::MalformedResponse(format!("Malformed policy response: {err}"))
    })
}

/// Fetch the runs of a policy in backend order (most recent first).
pub fn load_runs<C: ResourceClient + ?Sized>(
    client: &C,
    policy_id: &str,
) -> Result<Vec<Run>, LoadError> {
    let value = client.get(&runs_path(policy_id), &[]).map_err(|err| {
        tracing::warn!(policy_id, error = %err, "run list fetch failed");
        unavailable(&err, RUNS_FALLBACK)
    })?;
    Ok(decode_list(value, "runs"))
}

/// Fetch check results for a run, filtered server-side.
///
/// With no run selected there is nothing to show, so no request is made.
pub fn load_results<C: ResourceClient + ?Sized>(
    client: &C,
    run_id: Option<&str>,
    only_failed: bool,
) -> Result<Vec<CheckResult>, LoadError> {
    let Some(run_id) = run_id else {
        return Ok(Vec::new());
    };
    let query = [("only_failed", only_failed.to_string())];
    let value = client.get(&results_path(run_id), &query).map_err(|err| {
        tracing::warn!(run_id, only_failed, error = %err, "result fetch failed");
        unavailable(&err, RESULTS_FALLBACK)
    })?;
    let rows = match value {
        Value::Object(mut map) => map.remove("results").unwrap_or(Value::Null),
        _ => Value::Null,
    };
    Ok(decode_list(rows, "results"))
}

/// Ask the backend to execute a policy now.
///
/// Returns the created run when the backend echoes one back.
pub fn trigger_run<C: ResourceClient + ?Sized>(
    client: &C,
    policy_id: &str,
) -> Result<Option<Run>, LoadError> {
    let body = json!({ "mode": RUN_MODE_INLINE });
    let value = client.post(&runs_path(policy_id), &body).map_err(|err| {
        tracing::warn!(policy_id, error = %err, "run trigger failed");
        unavailable(&err, TRIGGER_FALLBACK)
    })?;
    Ok(serde_json::from_value(value).ok())
}

/// Fetch the policy index.
pub fn load_policies<C: ResourceClient + ?Sized>(
    client: &C,
) -> Result<Vec<PolicySummary>, LoadError> {
    let value = client.get(POLICIES_PATH, &[]).map_err(|err| {
        tracing::warn!(error = %err, "policy index fetch failed");
        unavailable(&err, POLICIES_FALLBACK)
    })?;
    Ok(decode_list(value, "policies"))
}

/// Fetch aggregate compliance statistics.
///
/// Missing fields default to zero; a body that is not an object is rejected.
pub fn load_stats<C: ResourceClient + ?Sized>(client: &C) -> Result<ComplianceStats, LoadError> {
    let value = client.get(STATS_PATH, &[]).map_err(|err| {
        tracing::warn!(error = %err, "stats fetch failed");
        unavailable(&err, STATS_FALLBACK)
    })?;
    if !value.is_object() {
        return Err(LoadError::MalformedResponse(
            "Malformed stats response: expected an object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|err| {
        tracing::warn!(error = %err, "stats payload rejected");
        LoadError::MalformedResponse(format!("Malformed stats response: {err}"))
    })
}

fn unavailable(err: &RemoteError, fallback: &str) -> LoadError {
    LoadError::ResourceUnavailable(err.backend_message().unwrap_or(fallback).to_string())
}

/// Decode a JSON array, treating anything else as empty and skipping rows
/// that do not match the expected shape.
fn decode_list<T: DeserializeOwned>(value: Value, label: &str) -> Vec<T> {
    let Value::Array(items) = value else {
        if !value.is_null() {
            tracing::warn!(label, "expected a JSON array; treating as empty");
        }
        return Vec::new();
    };
    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(row) => decoded.push(row),
            Err(err) => tracing::warn!(label, index, error = %err, "skipping malformed row"),
        }
    }
    decoded
}

#[cfg(test)]
#[path = "loaders_tests.rs"]
mod tests;
