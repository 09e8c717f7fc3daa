use anyhow::{anyhow, Context, Result};
use clap::Parser;
use policyview::cli::{
    Command, GlobalArgs, PoliciesArgs, RootArgs, ShowArgs, StatsArgs, TriggerArgs,
};
use policyview::config::{resolve_config, ConfigOverrides};
use policyview::report::{self, Notice};
use policyview::{loaders, HttpClient, MemoryClient, Phase, PolicyView, ResourceClient};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.global.verbose);

    if let Some(fixture) = &args.global.fixture {
        let client = MemoryClient::from_fixture(fixture)?;
        return run_command(client, &args.command);
    }
    let config = resolve_config(&overrides(&args.global), |key| std::env::var(key).ok())
        .context("resolve client config")?;
    tracing::debug!(
        base_url = %config.base_url,
        timeout_ms = config.timeout_ms,
        "client configured"
    );
    run_command(HttpClient::new(&config), &args.command)
}

/// Logs go to stderr so stdout stays parseable; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn overrides(global: &GlobalArgs) -> ConfigOverrides {
    ConfigOverrides {
        config_path: global.config.clone(),
        base_url: global.base_url.clone(),
        timeout_ms: global.timeout_ms,
    }
}

fn run_command<C: ResourceClient>(client: C, command: &Command) -> Result<()> {
    match command {
        Command::Policies(args) => cmd_policies(&client, args),
        Command::Show(args) => cmd_show(client, args),
        Command::Trigger(args) => cmd_trigger(client, args),
        Command::Stats(args) => cmd_stats(&client, args),
    }
}

fn cmd_policies<C: ResourceClient>(client: &C, args: &PoliciesArgs) -> Result<()> {
    let policies = loaders::load_policies(client)?;
    if args.json {
        let text = serde_json::to_string_pretty(&policies).context("serialize policies")?;
        println!("{text}");
    } else {
        print!("{}", report::policies_text(&policies));
    }
    Ok(())
}

fn cmd_stats<C: ResourceClient>(client: &C, args: &StatsArgs) -> Result<()> {
    let stats = loaders::load_stats(client)?;
    if args.json {
        let text = serde_json::to_string_pretty(&stats).context("serialize stats")?;
        println!("{text}");
    } else {
        print!("{}", report::stats_text(&stats));
    }
    Ok(())
}

fn cmd_show<C: ResourceClient>(client: C, args: &ShowArgs) -> Result<()> {
    let mut view = PolicyView::new(client);
    let mut notices = load_view(&mut view, &args.policy, args.only_failed);
    if let Some(run_id) = &args.run {
        if !view.state().runs().iter().any(|run| &run.id == run_id) {
            tracing::warn!(run_id = %run_id, "run is not listed for this policy");
        }
        if let Err(err) = view.select_run_by_id(run_id) {
            notices.push(Notice::from(&err));
        }
    }
    emit(&view, &notices, args.json)
}

fn cmd_trigger<C: ResourceClient>(client: C, args: &TriggerArgs) -> Result<()> {
    let mut view = PolicyView::new(client);
    let mut notices = load_view(&mut view, &args.policy, args.only_failed);
    let mut trigger_failed = false;
    if view.state().phase() == Phase::Ready {
        match view.trigger_run(&args.policy) {
            Ok(outcome) => {
                if let Err(err) = outcome.refresh {
                    notices.push(Notice::from(&err));
                }
            }
            Err(err) => {
                trigger_failed = true;
                notices.push(Notice::from(&err));
            }
        }
    }
    emit(&view, &notices, args.json)?;
    if trigger_failed {
        return Err(anyhow!("run trigger failed for policy {}", args.policy));
    }
    Ok(())
}

/// Apply the filter, then reload. A failed policy fetch is reported by the
/// view itself; other failures become notices.
fn load_view<C: ResourceClient>(
    view: &mut PolicyView<C>,
    policy_id: &str,
    only_failed: bool,
) -> Vec<Notice> {
    let mut notices = Vec::new();
    if let Err(err) = view.set_only_failed(only_failed) {
        notices.push(Notice::from(&err));
    }
    if let Err(err) = view.reload(policy_id) {
        if view.state().phase() != Phase::Error {
            notices.push(Notice::from(&err));
        }
    }
    notices
}

fn emit<C: ResourceClient>(view: &PolicyView<C>, notices: &[Notice], json: bool) -> Result<()> {
    let state = view.state();
    if json {
        println!("{}", report::view_json(state, notices).context("serialize view")?);
    } else {
        print!("{}", report::view_text(state));
        for notice in notices {
            eprintln!("warning: {}", notice.message);
        }
    }
    if state.phase() == Phase::Error {
        return Err(anyhow!(
            "failed to load policy: {}",
            state.error_message().unwrap_or("unknown error")
        ));
    }
    Ok(())
}
