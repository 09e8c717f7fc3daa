//! Plain-text and JSON rendering of a settled view.
use crate::error::LoadError;
use crate::model::{ComplianceStats, PolicySummary};
use crate::view::{Phase, ViewState};
use serde::Serialize;

/// Transient feedback attached to an output (a failed secondary action).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: &'static str,
    pub message: String,
}

impl From<&LoadError> for Notice {
    fn from(err: &LoadError) -> Self {
        Notice {
            kind: err.kind(),
            message: err.message().to_string(),
        }
    }
}

#[derive(Serialize)]
struct ViewDocument<'a> {
    view: &'a ViewState,
    notices: &'a [Notice],
}

/// Render the view and notices as pretty JSON.
pub fn view_json(state: &ViewState, notices: &[Notice]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ViewDocument {
        view: state,
        notices,
    })
}

/// Render the view for a terminal.
pub fn view_text(state: &ViewState) -> String {
    let mut out = String::new();
    if state.phase() == Phase::Error {
        let message = state.error_message().unwrap_or("Failed to load policy");
        out.push_str(&format!("error: {message}\n"));
        return out;
    }
    let Some(policy) = state.policy() else {
        out.push_str(&format!("({})\n", state.phase()));
        return out;
    };

    out.push_str(&format!("{} ({})\n", policy.name, policy.id));
    if let Some(description) = policy.description.as_deref() {
        out.push_str(&format!("  {description}\n"));
    }
    out.push_str(&format!(
        "  category: {}  severity: {}  active: {}\n",
        policy.category.as_deref().unwrap_or("-"),
        policy.severity.as_deref().unwrap_or("-"),
        if policy.is_active { "yes" } else { "no" }
    ));
    out.push_str(&format!("  rule: {}\n", policy.rule));

    if state.runs().is_empty() {
        out.push_str("\nNo runs yet.\n");
        return out;
    }

    let active_id = state.active_run().map(|run| run.id.as_str());
    out.push_str("\nRuns:\n");
    for run in state.runs() {
        let marker = if Some(run.id.as_str()) == active_id { '*' } else { ' ' };
        out.push_str(&format!(
            " {marker} {}  {:<10} {}  pass {} / fail {}  score {:.1}\n",
            run.id,
            run.status,
            run.started_at.as_deref().unwrap_or("-"),
            run.success_count,
            run.failure_count,
            run.score
        ));
        if let Some(error) = run.error_message.as_deref() {
            out.push_str(&format!("      error: {error}\n"));
        }
    }

    let filter = if state.only_failed() { "failing only" } else { "all" };
    out.push_str(&format!(
        "\nResults ({filter}, {} rows):\n",
        state.results().len()
    ));
    for result in state.results() {
        let verdict = if result.passed { "PASS" } else { "FAIL" };
        out.push_str(&format!(
            "  {verdict} {} {}",
            result.object_type,
            result.object_label()
        ));
        if let Some(message) = result.message.as_deref() {
            out.push_str(&format!("  {message}"));
        }
        out.push('\n');
    }
    out
}

/// Render the policy index for a terminal.
pub fn policies_text(policies: &[PolicySummary]) -> String {
    let mut out = String::new();
    if policies.is_empty() {
        out.push_str("No policies.\n");
        return out;
    }
    for policy in policies {
        out.push_str(&format!(
            "{}  {}  [{}{}]\n",
            policy.id,
            policy.name,
            policy.severity.as_deref().unwrap_or("-"),
            if policy.is_active { "" } else { ", inactive" }
        ));
    }
    out
}

/// Render aggregate statistics for a terminal.
pub fn stats_text(stats: &ComplianceStats) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Overall compliance: {:.1}%\n",
        stats.overall_compliance
    ));
    out.push_str(&format!("Active policies: {}\n", stats.active_policies));
    out.push_str(&format!("Critical issues: {}\n", stats.critical_issues));
    out
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
