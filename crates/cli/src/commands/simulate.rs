use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Args;
use replydesk_agent::PlaybookRuntime;
use replydesk_core::config::{AppConfig, LoadOptions};
use replydesk_core::domain::playbook::{Playbook, PolicyType};
use replydesk_core::domain::policy::{default_policy, PolicyConfig};
use replydesk_core::domain::samples::{default_sample_for, sample_order, sample_ticket};
use replydesk_core::domain::simulation::SimulationResult;
use replydesk_core::engine::DecisionInput;
use serde::Serialize;
use serde_json::Value;

use crate::commands::CommandResult;

const COMMAND: &str = "simulate";

#[derive(Debug, Clone, Default, Args)]
pub struct SimulateArgs {
    #[arg(long, help = "Playbook to run: wismo, cancel or address_change")]
    pub playbook: String,
    #[arg(long, help = "Customer ticket text (defaults to the playbook's sample ticket)")]
    pub ticket: Option<String>,
    #[arg(long, conflicts_with = "sample", help = "Path to an order JSON file")]
    pub order: Option<PathBuf>,
    #[arg(long, help = "Named sample order: shipped, pending or final_sale")]
    pub sample: Option<String>,
    #[arg(long, help = "Path to a policy JSON file (defaults to the built-in policy)")]
    pub policy: Option<PathBuf>,
    #[arg(long, help = "Skip configuration and use the deterministic engine only")]
    pub offline: bool,
}

#[derive(Debug, Serialize)]
struct SimulationReport<'a> {
    playbook: &'a str,
    ai_configured: bool,
    result: SimulationResult,
}

pub fn run(args: SimulateArgs) -> CommandResult {
    let playbook = Playbook::parse(&args.playbook);
    let ticket = args.ticket.clone().unwrap_or_else(|| sample_ticket(&playbook).to_string());

    let order = match resolve_order(&args, &playbook) {
        Ok(order) => order,
        Err(message) => return CommandResult::failure(COMMAND, "input", message, 2),
    };
    let policy = match resolve_policy(args.policy.as_deref(), &playbook) {
        Ok(policy) => policy,
        Err(message) => return CommandResult::failure(COMMAND, "input", message, 2),
    };

    let runtime = if args.offline {
        PlaybookRuntime::deterministic()
    } else {
        let config = match AppConfig::load(LoadOptions::default()) {
            Ok(config) => config,
            Err(error) => {
                return CommandResult::failure(
                    COMMAND,
                    "config_validation",
                    format!("configuration issue: {error}"),
                    2,
                );
            }
        };
        match PlaybookRuntime::from_config(&config.llm) {
            Ok(runtime) => runtime,
            Err(error) => return CommandResult::failure(COMMAND, "llm_setup", error.to_string(), 3),
        }
    };

    let async_runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = async_runtime.block_on(runtime.decide(
        &DecisionInput {
            ticket_text: &ticket,
            playbook: &playbook,
            policy: &policy,
            order: order.as_ref(),
        },
        "cli-simulate",
    ));

    CommandResult::data(
        COMMAND,
        &SimulationReport { playbook: playbook.as_str(), ai_configured: runtime.ai_configured(), result },
    )
}

fn resolve_order(args: &SimulateArgs, playbook: &Playbook) -> Result<Option<Value>, String> {
    if let Some(path) = &args.order {
        let raw = fs::read_to_string(path)
            .map_err(|error| format!("could not read order file `{}`: {error}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|error| format!("order file `{}` is not JSON: {error}", path.display()))?;
        return Ok(Some(value).filter(|value| !value.is_null()));
    }

    let name = args.sample.as_deref().unwrap_or_else(|| default_sample_for(playbook));
    sample_order(name).map(Some).ok_or_else(|| format!("unknown sample order `{name}`"))
}

fn resolve_policy(path: Option<&Path>, playbook: &Playbook) -> Result<PolicyConfig, String> {
    let Some(path) = path else {
        let policy_type = playbook.policy_type().unwrap_or(PolicyType::AddressChange);
        return Ok(default_policy(policy_type, Utc::now()));
    };

    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read policy file `{}`: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("policy file `{}` is not a policy: {error}", path.display()))
}
