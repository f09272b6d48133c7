pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "licibot",
    about = "Licibot operator CLI",
    long_about = "Ask one-shot questions against the procurement database, load demo \
                  fixtures, inspect configuration, and run readiness checks.",
    after_help = "Examples:\n  licibot ask \"¿Cuántas licitaciones hay en Lima?\"\n  licibot seed\n  licibot doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Ask the assistant one question and print the answer")]
    Ask {
        #[arg(help = "Question in Spanish, e.g. \"¿Cuántas licitaciones hay en Lima?\"")]
        question: String,
        #[arg(long, help = "Emit the full response payload as JSON")]
        json: bool,
    },
    #[command(about = "Load the deterministic demo dataset into the configured database")]
    Seed,
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
    #[command(about = "Validate config, database connectivity, and LLM readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { question, json } => commands::ask::run(&question, json),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
