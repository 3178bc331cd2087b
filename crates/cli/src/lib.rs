pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::simulate::SimulateArgs;

#[derive(Debug, Parser)]
#[command(
    name = "replydesk",
    about = "Replydesk operator CLI",
    long_about = "Run support playbooks against sample orders, inspect policies and configuration, and check runtime readiness.",
    after_help = "Examples:\n  replydesk simulate --playbook wismo --sample shipped\n  replydesk simulate --playbook cancel --order order.json --offline\n  replydesk doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run a ticket through a playbook and print the decision as JSON")]
    Simulate(SimulateArgs),
    #[command(about = "Print the default policy set as JSON")]
    Policies,
    #[command(about = "Print the sample orders and tickets as JSON")]
    Samples,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, AI capability, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Simulate(args) => commands::simulate::run(args),
        Command::Policies => commands::policies::run(),
        Command::Samples => commands::samples::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Migrate => commands::migrate::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
