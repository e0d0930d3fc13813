//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tk_shared::SigningAlgorithm;

#[derive(Debug, Parser)]
#[command(name = "tokenkeep")]
#[command(version, about = "Signing key management with zero-downtime rotation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Key store file, overrides JWT_KEY_STORAGE_PATH
    #[arg(long, global = true, value_name = "PATH")]
    pub storage_path: Option<PathBuf>,

    /// TOML configuration file; environment variables are used when absent
    #[arg(short, long, global = true, value_name = "FILE", env = "TOKENKEEP_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a new pending key; it signs nothing until `activate` promotes it
    Generate {
        /// Secret length in characters
        #[arg(long, default_value_t = 64)]
        length: usize,

        /// Key algorithm (HS256 or RS256)
        #[arg(long, default_value = "HS256")]
        algorithm: SigningAlgorithm,

        /// Write the secret to this file (mode 0600)
        #[arg(long, value_name = "FILE")]
        output_file: Option<PathBuf>,

        /// Show length and entropy of the generated secret
        #[arg(long)]
        show_info: bool,
    },

    /// Generate and activate a new signing key
    Rotate {
        /// Show the rotation plan without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Key algorithm (HS256 or RS256), the configured one when omitted
        #[arg(long)]
        algorithm: Option<SigningAlgorithm>,

        /// Secret length in characters
        #[arg(long, default_value_t = 64)]
        length: usize,

        /// Write the new secret to this file (mode 0600)
        #[arg(long, value_name = "FILE")]
        output_file: Option<PathBuf>,
    },

    /// Make a stored key the signing key, demoting the current one
    Activate {
        /// Id of the key to activate, as listed by `status --verbose`
        key_id: String,
    },

    /// Show key rotation status
    Status {
        /// List every key
        #[arg(short, long)]
        verbose: bool,
    },

    /// Remove old inactive keys
    Cleanup {
        /// Maximum age of inactive keys in days
        #[arg(long, default_value_t = 30)]
        max_age_days: u32,

        /// List the keys that would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the configured signing secret
    Validate {
        /// Show secret and configuration details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Export a secret-free summary of the configuration
    ExportConfig {
        /// Write the summary to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        output_file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tokenkeep",
            "status",
            "--verbose",
            "--storage-path",
            "/tmp/keys.json",
        ])
        .unwrap();

        assert_eq!(cli.storage_path, Some(PathBuf::from("/tmp/keys.json")));
        assert!(matches!(cli.command, Commands::Status { verbose: true }));
    }

    #[test]
    fn test_rotate_parses_algorithm() {
        let cli = Cli::try_parse_from(["tokenkeep", "rotate", "--algorithm", "RS256", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Rotate {
                dry_run, algorithm, length, ..
            } => {
                assert!(dry_run);
                assert_eq!(algorithm, Some(SigningAlgorithm::Rs256));
                assert_eq!(length, 64);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let result = Cli::try_parse_from(["tokenkeep", "generate", "--algorithm", "ES256"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_activate_takes_key_id() {
        let cli = Cli::try_parse_from(["tokenkeep", "activate", "3f2a9c"]).unwrap();
        assert!(matches!(cli.command, Commands::Activate { ref key_id } if key_id == "3f2a9c"));

        assert!(Cli::try_parse_from(["tokenkeep", "activate"]).is_err());
    }

    #[test]
    fn test_cleanup_defaults() {
        let cli = Cli::try_parse_from(["tokenkeep", "cleanup"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cleanup {
                max_age_days: 30,
                dry_run: false
            }
        ));
    }
}
