//! Key store commands: generate, activate, rotate, status and cleanup

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use tk_core::services::keys::format_duration;
use tk_core::services::secret::shannon_entropy;
use tk_core::{plan_rotation_for, KeyMaterial, KeyStatus, RotationUrgency, SecretPolicy};
use tk_shared::SigningAlgorithm;

use super::{print_field, print_header, print_info, print_success, print_warning, write_private_file};
use crate::context::CliContext;

/// Generates a pending key and stores it
pub fn generate(
    context: &CliContext,
    algorithm: SigningAlgorithm,
    length: usize,
    output_file: Option<&Path>,
    show_info: bool,
) -> Result<()> {
    let manager = context.key_manager()?;
    let record = manager
        .generate(algorithm, length)
        .context("Key generation failed")?;

    print_success(&format!("Generated {} key {}", record.algorithm, record.id));
    print_info(&format!(
        "The key is pending; run `tokenkeep activate {}` to start signing with it",
        record.id
    ));

    if show_info {
        println!();
        println!("{}", "Secret info:".bold());
        match &record.material {
            KeyMaterial::Symmetric { secret } => {
                let report = SecretPolicy::new(context.config.jwt.strict_mode).validate(secret);
                print_field("Length", format!("{} characters", secret.len()));
                print_field("Entropy", format!("{:.2} bits/char", shannon_entropy(secret)));
                print_field("Security score", format!("{}/100", report.score));
            }
            KeyMaterial::Asymmetric { .. } => {
                print_field("Key type", "RSA 2048-bit key pair");
            }
        }
    }

    deliver_secret(record.material.secret(), output_file)
}

/// Promotes a stored key to the signing key
pub fn activate(context: &CliContext, key_id: &str) -> Result<()> {
    let manager = context.key_manager()?;
    let demoted = manager.get_rotation_status()?.active_key_id;
    manager
        .activate(key_id)
        .with_context(|| format!("Failed to activate key {}", key_id))?;

    print_success(&format!("Key {} is now the signing key", key_id));
    if let Some(previous) = demoted.filter(|previous| previous != key_id) {
        print_field("Previous key ID", &previous);
        print_info(&format!(
            "The previous key keeps verifying tokens for {}",
            format_duration(manager.grace_period())
        ));
    }
    Ok(())
}

/// Rotates the signing key, or shows the rotation plan with `dry_run`
pub fn rotate(
    context: &CliContext,
    algorithm: Option<SigningAlgorithm>,
    length: usize,
    output_file: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let manager = context.key_manager()?;

    if dry_run {
        let status = manager.get_rotation_status()?;
        let plan = plan_rotation_for(&status, manager.config().rotation_interval);
        let algorithm = algorithm.unwrap_or(manager.config().default_algorithm);

        print_header("Key Rotation Plan (Dry Run)");
        print_field("Action", plan.action);
        print_field("Urgency", urgency_label(plan.urgency));
        print_field("Message", &plan.message);
        print_field("New key algorithm", algorithm);
        if let Some(active) = &status.active_key_id {
            print_field("Key to demote", active);
        }
        print_info("No changes were made");
        return Ok(());
    }

    let rotated = manager
        .rotate(algorithm, Some(length))
        .context("Key rotation failed")?;

    print_success("Key rotation completed");
    print_field("New key ID", &rotated.key_id);
    print_field("Algorithm", rotated.algorithm);
    match &rotated.previous_key_id {
        Some(previous) => {
            print_field("Previous key ID", previous);
            print_info(&format!(
                "The previous key keeps verifying tokens for {}",
                format_duration(manager.grace_period())
            ));
        }
        None => print_info("This is the first active key"),
    }

    deliver_secret(&rotated.secret, output_file)
}

/// Prints the rotation status and the recommended next step
pub fn status(context: &CliContext, verbose: bool) -> Result<()> {
    let manager = context.key_manager()?;
    let status = manager.get_rotation_status()?;

    print_header("Key Management Status");
    print_field("Key store", context.storage_path().display());

    match (&status.active_key_id, status.active_key_age) {
        (Some(active), Some(age)) => {
            print_field("Active key ID", active);
            print_field("Active key age", format_duration(age));
        }
        _ => print_warning("No active key found"),
    }
    if let (Some(previous), Some(remaining)) = (&status.previous_key_id, status.previous_grace_remaining) {
        print_field("Previous key ID", previous);
        print_field("Grace remaining", format_duration(remaining));
    }
    print_field("Total keys", status.total_keys);
    print_field("Inactive keys", status.inactive_keys);
    print_field("Rotation count", status.rotation_count);
    print_field("Grace period", format_duration(status.grace_period));

    if verbose {
        let keys = manager.list_keys()?;
        println!();
        println!("{}", "All keys:".bold());
        if keys.is_empty() {
            println!("  (none)");
        }
        for key in keys {
            println!(
                "  {} {} {} created {}",
                status_symbol(key.status),
                key.id,
                format!("[{}, {}]", key.algorithm, key.status).dimmed(),
                key.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    let plan = plan_rotation_for(&status, manager.config().rotation_interval);
    println!();
    println!(
        "{} {} ({})",
        "Rotation plan:".bold(),
        plan.message,
        urgency_label(plan.urgency)
    );
    Ok(())
}

/// Removes inactive keys older than `max_age_days`
pub fn cleanup(context: &CliContext, max_age_days: u32, dry_run: bool) -> Result<()> {
    let manager = context.key_manager()?;
    let removed = manager
        .cleanup_old_keys(max_age_days, dry_run)
        .context("Key cleanup failed")?;

    if dry_run {
        print_info(&format!(
            "Dry run: would remove {} key(s) older than {} days",
            removed.len(),
            max_age_days
        ));
    } else {
        print_success(&format!("Cleaned up {} old key(s)", removed.len()));
    }
    for key_id in &removed {
        println!("  - {}", key_id);
    }
    Ok(())
}

fn deliver_secret(secret: &str, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            write_private_file(path, &format!("{}\n", secret))?;
            print_success(&format!("Secret written to {}", path.display()));
        }
        None => print_warning("Secret withheld from terminal output; use --output-file to save it"),
    }
    Ok(())
}

fn status_symbol(status: KeyStatus) -> ColoredString {
    match status {
        KeyStatus::Active => "●".green(),
        KeyStatus::Previous => "◐".yellow(),
        KeyStatus::Pending => "○".blue(),
        KeyStatus::Retired => "○".dimmed(),
    }
}

fn urgency_label(urgency: RotationUrgency) -> ColoredString {
    let label = urgency.to_string();
    match urgency {
        RotationUrgency::Low => label.green(),
        RotationUrgency::Medium => label.yellow(),
        RotationUrgency::High => label.red().bold(),
    }
}
