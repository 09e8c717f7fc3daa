//! Compliance policy run viewer.
//!
//! Loads a policy, its runs, and the active run's check results from the
//! compliance REST API, and keeps that dependent chain consistent while the
//! user switches runs, toggles the failing-only filter, or starts a new run.
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod loaders;
pub mod memory;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod view;

pub use client::{HttpClient, RemoteError, RemoteResult, ResourceClient};
pub use error::LoadError;
pub use memory::MemoryClient;
pub use model::{CheckResult, ComplianceStats, Policy, PolicySummary, Run};
pub use orchestrator::{PolicyView, TriggerOutcome};
pub use view::{Phase, ViewState};
