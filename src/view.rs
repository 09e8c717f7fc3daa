//! View state for the policy run viewer.
//!
//! `ViewState` is mutated only through the transitions below. Every outbound
//! fetch is split into an issue half, which returns a ticket stamped by the
//! slice's [`Sequencer`], and an apply half, which takes the ticket back with
//! the loader outcome. An apply whose ticket is no longer the latest issued
//! for its slice is dropped, so overlapping requests resolve last-request-wins
//! no matter the order responses arrive in.
use crate::error::LoadError;
use crate::model::{CheckResult, Policy, Run};
use serde::Serialize;
use std::fmt;

/// Screen-level lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl Phase {
    /// Return the stable string identifier used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic request counter for one slice of the view.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    issued: u64,
}

impl Sequencer {
    /// Stamp a new request; it supersedes every earlier one.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Supersede outstanding requests without issuing a new one.
    pub fn invalidate(&mut self) {
        self.issued += 1;
    }

    /// Whether `seq` is the most recently issued request.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.issued
    }

    /// Most recently issued sequence number.
    pub fn latest(&self) -> u64 {
        self.issued
    }
}

/// Outstanding policy fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTicket {
    pub seq: u64,
    pub policy_id: String,
}

/// Outstanding run-list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunsTicket {
    pub seq: u64,
    pub policy_id: String,
}

/// Outstanding result fetch for `(run_id, only_failed)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsTicket {
    pub seq: u64,
    pub run_id: String,
    pub only_failed: bool,
}

impl ResultsTicket {
    fn key(&self) -> ResultsKey {
        ResultsKey {
            run_id: self.run_id.clone(),
            only_failed: self.only_failed,
        }
    }
}

/// Identity of a result list: which run, which filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsKey {
    pub run_id: String,
    pub only_failed: bool,
}

/// Everything the run viewer shows for one policy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewState {
    policy_id: Option<String>,
    policy: Option<Policy>,
    runs: Vec<Run>,
    active_run: Option<Run>,
    results: Vec<CheckResult>,
    only_failed: bool,
    phase: Phase,
    error_message: Option<String>,
    runs_loading: bool,
    trigger_pending: bool,
    results_key: Option<ResultsKey>,
    pending_results: Option<ResultsKey>,
    #[serde(skip)]
    policy_seq: Sequencer,
    #[serde(skip)]
    runs_seq: Sequencer,
    #[serde(skip)]
    results_seq: Sequencer,
    #[serde(skip)]
    explicit_selection: Option<String>,
}

impl ViewState {
    /// Fresh state for a new screen visit.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy_id(&self) -> Option<&str> {
        self.policy_id.as_deref()
    }

    pub fn policy(&self) -> Option<&Policy> {
        self.policy.as_ref()
    }

    /// Runs in backend order, most recent first.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn active_run(&self) -> Option<&Run> {
        self.active_run.as_ref()
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn only_failed(&self) -> bool {
        self.only_failed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn runs_loading(&self) -> bool {
        self.runs_loading
    }

    pub fn results_loading(&self) -> bool {
        self.pending_results.is_some()
    }

    pub fn trigger_pending(&self) -> bool {
        self.trigger_pending
    }

    /// The `(run, filter)` pair the current `results` were fetched for.
    pub fn results_key(&self) -> Option<&ResultsKey> {
        self.results_key.as_ref()
    }

    /// Ready with a policy but no runs yet: a valid state, not a failure.
    pub fn is_empty_policy(&self) -> bool {
        self.phase == Phase::Ready && self.policy.is_some() && self.runs.is_empty()
    }

    /// Objects checked by the active run.
    pub fn active_run_total(&self) -> u64 {
        self.active_run.as_ref().map_or(0, Run::total_checked)
    }

    /// Number of failing rows in the current result list.
    pub fn failing_results(&self) -> usize {
        self.results.iter().filter(|result| !result.passed).count()
    }

    /// Start a full reload: clear everything and fetch the policy.
    ///
    /// Outstanding run and result fetches are superseded. The filter choice
    /// survives a reload.
    pub fn begin_reload(&mut self, policy_id: &str) -> PolicyTicket {
        self.policy_id = Some(policy_id.to_string());
        self.policy = None;
        self.runs.clear();
        self.active_run = None;
        self.results.clear();
        self.results_key = None;
        self.pending_results = None;
        self.runs_loading = false;
        self.explicit_selection = None;
        self.error_message = None;
        self.phase = Phase::Loading;
        self.runs_seq.invalidate();
        self.results_seq.invalidate();
        PolicyTicket {
            seq: self.policy_seq.issue(),
            policy_id: policy_id.to_string(),
        }
    }

    /// Apply the policy fetch; on success the run list is requested next.
    pub fn apply_policy(
        &mut self,
        ticket: PolicyTicket,
        outcome: Result<Policy, LoadError>,
    ) -> Option<RunsTicket> {
        if !self.policy_seq.is_current(ticket.seq) {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.policy_seq.latest(),
                policy_id = %ticket.policy_id,
                "dropping superseded policy response"
            );
            return None;
        }
        match outcome {
            Ok(policy) => {
                self.policy = Some(policy);
                Some(self.issue_runs(ticket.policy_id))
            }
            Err(err) => {
                self.phase = Phase::Error;
                self.error_message = Some(err.message().to_string());
                None
            }
        }
    }

    /// Start a run-list refresh for the loaded policy.
    ///
    /// Returns `None` when `policy_id` is not the policy on screen.
    pub fn begin_runs_refresh(&mut self, policy_id: &str) -> Option<RunsTicket> {
        if self.policy.is_none() || self.policy_id.as_deref() != Some(policy_id) {
            return None;
        }
        Some(self.issue_runs(policy_id.to_string()))
    }

    fn issue_runs(&mut self, policy_id: String) -> RunsTicket {
        self.runs_loading = true;
        self.explicit_selection = None;
        RunsTicket {
            seq: self.runs_seq.issue(),
            policy_id,
        }
    }

    /// Apply a run-list fetch and re-derive the active run.
    ///
    /// The newest run becomes active unless the caller picked another run
    /// while this refresh was in flight and that run is still listed. On
    /// failure the previous list stays in place.
    pub fn apply_runs(
        &mut self,
        ticket: RunsTicket,
        outcome: Result<Vec<Run>, LoadError>,
    ) -> Option<ResultsTicket> {
        if !self.runs_seq.is_current(ticket.seq) {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.runs_seq.latest(),
                policy_id = %ticket.policy_id,
                "dropping superseded run list"
            );
            return None;
        }
        self.runs_loading = false;
        let explicit = self.explicit_selection.take();
        let runs = match outcome {
            Ok(runs) => runs,
            Err(_) => {
                self.settle();
                return None;
            }
        };
        self.runs = runs;
        let active = explicit
            .and_then(|id| self.runs.iter().find(|run| run.id == id))
            .or_else(|| self.runs.first())
            .cloned();
        self.active_run = active;

        let Some(run_id) = self.active_run.as_ref().map(|run| run.id.clone()) else {
            self.results.clear();
            self.results_key = None;
            self.pending_results = None;
            self.results_seq.invalidate();
            self.settle();
            return None;
        };
        Some(self.issue_results(run_id))
    }

    /// Make `run_id` the active run and request its results.
    ///
    /// Ids not in the current run list are ignored, as is re-selecting the
    /// active run while its results are current or already in flight.
    pub fn select_run(&mut self, run_id: &str) -> Option<ResultsTicket> {
        let Some(run) = self.runs.iter().find(|run| run.id == run_id).cloned() else {
            tracing::debug!(run_id, "ignoring selection of unlisted run");
            return None;
        };
        if self.runs_loading {
            self.explicit_selection = Some(run.id.clone());
        }
        self.active_run = Some(run);
        if self.results_up_to_date() {
            return None;
        }
        Some(self.issue_results(run_id.to_string()))
    }

    /// Change the failing-only filter and re-request results for the active run.
    pub fn set_only_failed(&mut self, only_failed: bool) -> Option<ResultsTicket> {
        self.only_failed = only_failed;
        let run_id = self.active_run.as_ref()?.id.clone();
        if self.results_up_to_date() {
            return None;
        }
        Some(self.issue_results(run_id))
    }

    fn wanted_results(&self) -> Option<ResultsKey> {
        self.active_run.as_ref().map(|run| ResultsKey {
            run_id: run.id.clone(),
            only_failed: self.only_failed,
        })
    }

    fn results_up_to_date(&self) -> bool {
        let wanted = self.wanted_results();
        match &self.pending_results {
            Some(pending) => wanted.as_ref() == Some(pending),
            None => wanted.is_some() && wanted == self.results_key,
        }
    }

    fn issue_results(&mut self, run_id: String) -> ResultsTicket {
        let ticket = ResultsTicket {
            seq: self.results_seq.issue(),
            run_id,
            only_failed: self.only_failed,
        };
        self.pending_results = Some(ticket.key());
        ticket
    }

    /// Apply a result fetch. Returns whether the response was used.
    ///
    /// A failed fetch leaves the previous rows on screen.
    pub fn apply_results(
        &mut self,
        ticket: ResultsTicket,
        outcome: Result<Vec<CheckResult>, LoadError>,
    ) -> bool {
        if !self.results_seq.is_current(ticket.seq) {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.results_seq.latest(),
                run_id = %ticket.run_id,
                only_failed = ticket.only_failed,
                "dropping superseded results"
            );
            return false;
        }
        self.pending_results = None;
        if let Ok(results) = outcome {
            self.results_key = Some(ticket.key());
            self.results = results;
        }
        self.settle();
        true
    }

    /// Mark a run trigger as in flight.
    pub fn begin_trigger(&mut self) {
        self.trigger_pending = true;
    }

    /// Finish a run trigger; a success refreshes the run list.
    pub fn finish_trigger<T>(
        &mut self,
        policy_id: &str,
        outcome: &Result<T, LoadError>,
    ) -> Option<RunsTicket> {
        self.trigger_pending = false;
        match outcome {
            Ok(_) => self.begin_runs_refresh(policy_id),
            Err(_) => None,
        }
    }

    /// End the initial load once the dependency chain has nothing left to fetch.
    fn settle(&mut self) {
        if self.phase == Phase::Loading {
            self.phase = Phase::Ready;
        }
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
