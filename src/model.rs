//! Wire types for the compliance API.
//!
//! These mirror the backend's JSON documents. Unknown fields are ignored and
//! optional columns default so older or newer backends still decode.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A compliance rule definition as returned by `GET /api/compliance/policies/{id}`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rule: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub examples: Option<PolicyExamples>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Sample objects that satisfy or violate a policy rule.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PolicyExamples {
    #[serde(default)]
    pub pass: Vec<Value>,
    #[serde(default)]
    pub fail: Vec<Value>,
}

/// Index entry for the policy list endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PolicySummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// One execution of a policy's checks.
///
/// `status` is kept as the backend's string; nothing in the view branches on it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Run {
    pub id: String,
    pub policy_id: String,
    pub status: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Run {
    /// Number of objects checked in this run.
    pub fn total_checked(&self) -> u64 {
        self.success_count + self.failure_count
    }
}

/// Pass/fail outcome of checking one object within one run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CheckResult {
    pub id: String,
    pub run_id: String,
    pub object_type: String,
    pub object_id: String,
    #[serde(default)]
    pub object_name: Option<String>,
    pub passed: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details_json: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl CheckResult {
    /// Display label for the checked object, preferring its name.
    pub fn object_label(&self) -> &str {
        self.object_name.as_deref().unwrap_or(&self.object_id)
    }
}

/// Aggregate compliance figures across active policies.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ComplianceStats {
    /// Mean compliance percentage of active policies; 0 with none active.
    #[serde(default)]
    pub overall_compliance: f64,
    #[serde(default)]
    pub active_policies: u64,
    /// Active critical policies below 70% compliance.
    #[serde(default)]
    pub critical_issues: u64,
}
