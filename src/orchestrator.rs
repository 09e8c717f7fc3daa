//! Drives the policy → runs → results chain against a [`ResourceClient`].
//!
//! `PolicyView` owns one screen visit's [`ViewState`] and performs each fetch
//! synchronously between the state's issue and apply halves. Actions other
//! than `reload` report failures to the caller for transient display and never
//! move the view into its error phase.
use crate::client::ResourceClient;
use crate::error::LoadError;
use crate::loaders;
use crate::model::Run;
use crate::view::{ResultsTicket, RunsTicket, ViewState};
use std::time::Instant;

/// Result of a run trigger the backend accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    /// The created run, when the backend echoes it.
    pub created: Option<Run>,
    /// Outcome of the run-list refresh that follows.
    pub refresh: Result<(), LoadError>,
}

/// One policy screen: a client plus the state it feeds.
pub struct PolicyView<C> {
    client: C,
    state: ViewState,
}

impl<C: ResourceClient> PolicyView<C> {
    /// Start an idle view over `client`.
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: ViewState::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Load a policy, its runs, and the newest run's results, in that order.
    ///
    /// A policy failure leaves the view in the error phase. A run or result
    /// failure still ends `Ready` with what was loaded, and is returned.
    pub fn reload(&mut self, policy_id: &str) -> Result<(), LoadError> {
        let start = Instant::now();
        let ticket = self.state.begin_reload(policy_id);
        let outcome = loaders::load_policy(&self.client, &ticket.policy_id);
        let failure = outcome.as_ref().err().cloned();
        let outcome_result = match self.state.apply_policy(ticket, outcome) {
            Some(runs_ticket) => self.refresh_runs(runs_ticket),
            None => failure.map_or(Ok(()), Err),
        };
        tracing::info!(
            policy_id,
            phase = %self.state.phase(),
            runs = self.state.runs().len(),
            results = self.state.results().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "policy view loaded"
        );
        outcome_result
    }

    /// Show results for another run from the current list.
    pub fn select_run(&mut self, run: &Run) -> Result<(), LoadError> {
        self.select_run_by_id(&run.id)
    }

    /// Show results for the listed run with id `run_id`; unknown ids are ignored.
    pub fn select_run_by_id(&mut self, run_id: &str) -> Result<(), LoadError> {
        match self.state.select_run(run_id) {
            Some(ticket) => self.fetch_results(ticket),
            None => Ok(()),
        }
    }

    /// Toggle the failing-only filter; results are re-fetched, not re-filtered.
    pub fn set_only_failed(&mut self, only_failed: bool) -> Result<(), LoadError> {
        match self.state.set_only_failed(only_failed) {
            Some(ticket) => self.fetch_results(ticket),
            None => Ok(()),
        }
    }

    /// Execute the policy now, then refresh the run list so the new run
    /// becomes active.
    ///
    /// `Err` means the run was not started. Once the backend has accepted the
    /// run, a failed refresh is carried in [`TriggerOutcome::refresh`] with
    /// the previous runs left on screen.
    pub fn trigger_run(&mut self, policy_id: &str) -> Result<TriggerOutcome, LoadError> {
        self.state.begin_trigger();
        let outcome = loaders::trigger_run(&self.client, policy_id);
        let runs_ticket = self.state.finish_trigger(policy_id, &outcome);
        let created = outcome?;
        tracing::info!(
            policy_id,
            run_id = created.as_ref().map(|run| run.id.as_str()),
            "run triggered"
        );
        let refresh = match runs_ticket {
            Some(ticket) => self.refresh_runs(ticket),
            None => Ok(()),
        };
        Ok(TriggerOutcome { created, refresh })
    }

    fn refresh_runs(&mut self, ticket: RunsTicket) -> Result<(), LoadError> {
        let outcome = loaders::load_runs(&self.client, &ticket.policy_id);
        let failure = outcome.as_ref().err().cloned();
        if let Some(results_ticket) = self.state.apply_runs(ticket, outcome) {
            self.fetch_results(results_ticket)?;
        }
        failure.map_or(Ok(()), Err)
    }

    fn fetch_results(&mut self, ticket: ResultsTicket) -> Result<(), LoadError> {
        tracing::debug!(
            run_id = %ticket.run_id,
            only_failed = ticket.only_failed,
            seq = ticket.seq,
            "fetching results"
        );
        let outcome =
            loaders::load_results(&self.client, Some(ticket.run_id.as_str()), ticket.only_failed);
        let failure = outcome.as_ref().err().cloned();
        self.state.apply_results(ticket, outcome);
        failure.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
