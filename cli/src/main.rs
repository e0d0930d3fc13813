use clap::Parser;
use colored::*;
use std::process::ExitCode;

use tk_cli::{commands, logging, Cli, CliContext};
use tk_shared::Environment;

fn main() -> ExitCode {
    // Overlay first; dotenvy never overrides a variable that is already set
    if let Ok(environment) = Environment::from_env() {
        dotenvy::from_filename(environment.env_file()).ok();
    }
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let context = match CliContext::load(cli.config.as_deref(), cli.storage_path.clone()) {
        Ok(context) => context,
        Err(err) => {
            eprintln!("{} {:#}", "✗".red().bold(), err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logging::init_logging(&context.config.logging) {
        eprintln!("{} {}", "⚠".yellow().bold(), err);
    }

    match commands::run(&cli.command, &context) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            commands::print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
