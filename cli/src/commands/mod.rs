//! Command implementations

pub mod config;
pub mod keys;

use anyhow::{Context, Result};
use colored::*;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::args::Commands;
use crate::context::CliContext;

/// Dispatches a parsed command
pub fn run(command: &Commands, context: &CliContext) -> Result<()> {
    match command {
        Commands::Generate {
            length,
            algorithm,
            output_file,
            show_info,
        } => keys::generate(context, *algorithm, *length, output_file.as_deref(), *show_info),
        Commands::Rotate {
            dry_run,
            algorithm,
            length,
            output_file,
        } => {
            context.validate_startup()?;
            keys::rotate(context, *algorithm, *length, output_file.as_deref(), *dry_run)
        }
        Commands::Activate { key_id } => {
            context.validate_startup()?;
            keys::activate(context, key_id)
        }
        Commands::Status { verbose } => {
            context.validate_startup()?;
            keys::status(context, *verbose)
        }
        Commands::Cleanup { max_age_days, dry_run } => {
            context.validate_startup()?;
            keys::cleanup(context, *max_age_days, *dry_run)
        }
        Commands::Validate { verbose } => config::validate(context, *verbose),
        Commands::ExportConfig { output_file } => config::export_config(context, output_file.as_deref()),
    }
}

/// Writes `content` to a file readable only by its owner
pub fn write_private_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn print_header(title: &str) {
    println!("{}", title.bold().green());
    println!("{}", "=".repeat(title.chars().count()));
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message.blue());
}

pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<22} {}", format!("{}:", label), value);
}
