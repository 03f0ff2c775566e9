pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "osvoice",
    about = "OneSphere voice skill operator CLI",
    long_about = "Inspect configuration, check OneSphere readiness, and run voice requests locally.",
    after_help = "Examples:\n  osvoice doctor --json\n  osvoice config\n  osvoice invoke event.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, OneSphere authentication, and status endpoint checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run a voice request JSON file through the skill and print the response")]
    Invoke {
        #[arg(help = "Path to a voice-platform request event")]
        event: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Invoke { event } => commands::invoke::run(&event),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
