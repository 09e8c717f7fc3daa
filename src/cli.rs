//! CLI argument parsing for the policy run viewer.
//!
//! The CLI is thin: each command drives a `PolicyView` through the same
//! actions a screen would invoke and prints the settled view.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "policyview",
    version,
    about = "Inspect compliance policies, their runs, and check results",
    after_help = concat!(
        "Examples:\n",
        "  policyview policies\n",
        "  policyview show --policy p1\n",
        "  policyview show --policy p1 --run r2 --only-failed\n",
        "  policyview trigger --policy p1 --json\n",
        "  policyview stats\n",
        "  policyview --fixture demo.json show --policy p1"
    ),
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection and logging options shared by every command.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// JSON config file (defaults to <config_dir>/policyview/config.json)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Compliance API base URL
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Serve requests from a canned-response fixture instead of the network
    #[arg(
        long,
        value_name = "PATH",
        global = true,
        conflicts_with_all = ["base_url", "config", "timeout_ms"]
    )]
    pub fixture: Option<PathBuf>,

    /// Emit debug logs on stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Policies(PoliciesArgs),
    Show(ShowArgs),
    Trigger(TriggerArgs),
    Stats(StatsArgs),
}

/// List the policy index.
#[derive(Parser, Debug)]
#[command(about = "List compliance policies")]
pub struct PoliciesArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Load a policy with its runs and results.
#[derive(Parser, Debug)]
#[command(about = "Show a policy, its runs, and the active run's results")]
pub struct ShowArgs {
    /// Policy identifier
    #[arg(long, value_name = "ID")]
    pub policy: String,

    /// Show results for this run instead of the newest
    #[arg(long, value_name = "RUN_ID")]
    pub run: Option<String>,

    /// Only show failing results
    #[arg(long)]
    pub only_failed: bool,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Execute a policy now and show the refreshed view.
#[derive(Parser, Debug)]
#[command(about = "Run a policy's checks now and show the new run")]
pub struct TriggerArgs {
    /// Policy identifier
    #[arg(long, value_name = "ID")]
    pub policy: String,

    /// Only show failing results
    #[arg(long)]
    pub only_failed: bool,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Print aggregate compliance statistics.
#[derive(Parser, Debug)]
#[command(about = "Show overall compliance across active policies")]
pub struct StatsArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
