//! Configuration commands: validate and export-config

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::path::Path;

use tk_core::{SecretPolicy, SecretValidationReport, StaticKeyProvider};
use tk_shared::JwtConfig;

use super::{print_field, print_header, print_info, print_success, print_warning, write_private_file};
use crate::context::CliContext;

/// Reports on the configured signing material
///
/// Fails when the primary secret does not pass the policy.
pub fn validate(context: &CliContext, verbose: bool) -> Result<()> {
    let jwt = &context.config.jwt;
    print_header("Secret Validation Report");

    if !jwt.algorithm.is_symmetric() {
        let provider = StaticKeyProvider::from_jwt_config(jwt).context("RS256 key files are not usable")?;
        print_success("RS256 key pair loaded");
        print_field("Key ID", provider.current_key_id());
        print_advisories(jwt);
        if verbose {
            print_details(jwt, None);
        }
        return Ok(());
    }

    if jwt.secret.is_empty() {
        bail!("JWT_SECRET is not set");
    }

    let policy = SecretPolicy::new(jwt.strict_mode);
    let report = policy.validate(&jwt.secret);

    if report.valid {
        print_success("Secret configuration is valid");
    } else {
        print_warning("Secret configuration has issues");
    }
    print_field("Security score", format!("{}/100", report.score));

    if !report.reasons.is_empty() {
        println!("\nProblems:");
        for reason in &report.reasons {
            println!("  - {}", reason);
        }
    }
    if !report.recommendations.is_empty() {
        println!("\nRecommendations:");
        for (i, recommendation) in report.recommendations.iter().enumerate() {
            println!("  {}. {}", i + 1, recommendation);
        }
    }

    if let Some(previous) = jwt.previous_secret.as_deref().filter(|s| !s.is_empty()) {
        let previous_report = policy.validate(previous);
        println!();
        if previous_report.valid {
            print_success("Previous secret is valid");
        } else {
            print_warning(&format!(
                "Previous secret has issues: {}",
                previous_report.reasons.join("; ")
            ));
        }
    }

    print_advisories(jwt);
    if verbose {
        print_details(jwt, Some(&report));
    }

    if !report.valid {
        bail!("Secret validation failed");
    }
    Ok(())
}

/// Writes a secret-free summary of the configuration as JSON
pub fn export_config(context: &CliContext, output_file: Option<&Path>) -> Result<()> {
    let document = exported_config(&context.config.jwt);
    let rendered = serde_json::to_string_pretty(&document)?;

    match output_file {
        Some(path) => {
            write_private_file(path, &format!("{}\n", rendered))?;
            print_success(&format!("Configuration exported to {}", path.display()));
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Configuration summary without any secret material
pub fn exported_config(jwt: &JwtConfig) -> Value {
    let mut recommendations = Vec::new();
    let mut secret_length = Value::Null;
    if jwt.algorithm.is_symmetric() && !jwt.secret.is_empty() {
        let report = SecretPolicy::new(jwt.strict_mode).validate(&jwt.secret);
        secret_length = json!(report.length);
        recommendations.extend(report.recommendations);
    }
    recommendations.extend(jwt.advisories());

    json!({
        "algorithm": jwt.algorithm,
        "encryption_enabled": jwt.enable_encryption,
        "secret_length": secret_length,
        "key_rotation_enabled": jwt.key_rotation_enabled(),
        "access_token_expiry_minutes": jwt.access_token_expiry_minutes,
        "grace_period_hours": jwt.grace_period_hours,
        "rotation_interval_days": jwt.rotation_interval_days,
        "strict_mode": jwt.strict_mode,
        "max_clock_skew_seconds": jwt.max_clock_skew_seconds,
        "key_storage_path": jwt.key_storage_path,
        "required_claims": jwt.required_claims,
        "recommendations": recommendations,
    })
}

fn print_advisories(jwt: &JwtConfig) {
    let advisories = jwt.advisories();
    if advisories.is_empty() {
        return;
    }
    println!();
    for advisory in advisories {
        print_info(&advisory);
    }
}

fn print_details(jwt: &JwtConfig, report: Option<&SecretValidationReport>) {
    println!("\nConfiguration:");
    print_field("Algorithm", jwt.algorithm);
    if let Some(report) = report {
        print_field("Secret length", format!("{} characters", report.length));
        print_field("Entropy", format!("{:.2} bits/char", report.entropy));
        print_field("Diversity", format!("{:.2}", report.diversity));
    }
    print_field("Encryption enabled", jwt.enable_encryption);
    print_field("Key rotation", jwt.key_rotation_enabled());
    print_field("Strict mode", jwt.strict_mode);
    print_field("Token lifetime", format!("{} minutes", jwt.access_token_expiry_minutes));
    print_field("Grace period", format!("{} hours", jwt.grace_period_hours));
}
