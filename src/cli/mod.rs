//! Command-line interface for buildpack-notify.
//!
//! The program has no subcommands: one invocation is one notification pass.
//! Every setting comes from an environment variable (see [`crate::config`]),
//! so a typical deployment runs it without arguments:
//!
//! ```bash
//! export IN_STATE=/var/lib/notify/in.json OUT_STATE=/var/lib/notify/out.json
//! export CF_API=https://api.example.com CLIENT_ID=notify CLIENT_SECRET=...
//! export SMTP_FROM=no-reply@example.com SMTP_HOST=smtp.example.com SMTP_PORT=587
//! export SMTP_USER=notify SMTP_PASSWORD=...
//! buildpack-notify
//!
//! # Preview who would be notified
//! DRY_RUN=true buildpack-notify --verbose
//! ```
//!
//! # Logging
//!
//! - `--verbose` - debug output, including per-request platform logging
//! - `--quiet` - warnings and errors only
//! - otherwise `RUST_LOG` if set, else `info`

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{CfApiConfig, Config, EmailConfig, RunConfig};
use crate::runner;

/// Notify application owners when a system buildpack update leaves their
/// running applications outdated.
#[derive(Debug, Parser)]
#[command(
    name = "buildpack-notify",
    version,
    about = "Notify Cloud Foundry app owners about outdated system buildpacks",
    long_about = "Compares system buildpack update times against the droplets of running applications \
                  and e-mails the space managers and developers of every app that needs a restage."
)]
pub struct Cli {
    #[command(flatten)]
    run: RunConfig,

    #[command(flatten)]
    cf_api: CfApiConfig,

    #[command(flatten)]
    email: EmailConfig,

    /// Enable debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only output warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Log filter implied by the verbosity flags.
    ///
    /// `None` defers to `RUST_LOG`.
    #[must_use]
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }

    /// Split the parsed arguments into the immutable run configuration.
    #[must_use]
    pub fn into_config(self) -> Config {
        Config {
            run: self.run,
            cf_api: self.cf_api,
            email: self.email,
        }
    }

    /// Install the log subscriber and run one pass.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_level());
        let config = self.into_config();
        tracing::debug!(?config, "Parsed configuration");

        runner::run(&config).await?;
        Ok(())
    }
}

/// Install the global `tracing` subscriber, writing to stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const REQUIRED: &[&str] = &[
        "buildpack-notify",
        "--in-state",
        "in.json",
        "--out-state",
        "out.json",
        "--cf-api",
        "https://api.example.com",
        "--client-id",
        "notify",
        "--client-secret",
        "secret",
        "--smtp-from",
        "no-reply@example.com",
        "--smtp-host",
        "smtp.example.com",
        "--smtp-port",
        "587",
        "--smtp-user",
        "mailer",
        "--smtp-password",
        "hunter2",
    ];

    fn args(extra: &[&str]) -> Vec<String> {
        REQUIRED.iter().chain(extra).map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from(args(&["--dry-run", "--insecure", "--smtp-cert", "PEM"])).unwrap();
        assert_eq!(cli.log_level(), None);

        let config = cli.into_config();
        assert_eq!(config.run.in_state, PathBuf::from("in.json"));
        assert_eq!(config.run.out_state, PathBuf::from("out.json"));
        assert!(config.run.dry_run);
        assert_eq!(config.cf_api.api, "https://api.example.com");
        assert!(config.cf_api.insecure);
        assert_eq!(config.email.port, 587);
        assert_eq!(config.email.cert.as_deref(), Some("PEM"));
    }

    #[test]
    fn test_optional_flags_default_off() {
        let config = Cli::try_parse_from(args(&[])).unwrap().into_config();
        assert!(!config.run.dry_run);
        assert!(!config.cf_api.insecure);
        assert!(config.email.cert.is_none());
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(Cli::try_parse_from(args(&["-v"])).unwrap().log_level(), Some("debug"));
        assert_eq!(Cli::try_parse_from(args(&["--quiet"])).unwrap().log_level(), Some("warn"));
        assert!(Cli::try_parse_from(args(&["-v", "-q"])).is_err());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut argv = args(&[]);
        let port = argv.iter().position(|a| a == "587").unwrap();
        argv[port] = "not-a-port".to_string();
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
