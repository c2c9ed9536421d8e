//! Process configuration.
//!
//! Every setting is sourced from the environment variable the deployment
//! already provides (and can also be given as a long flag). Parsing happens
//! once in [`crate::cli::Cli`]; the result is an immutable [`Config`] that is
//! passed by reference into each component. Nothing reads the environment
//! after startup.
//!
//! | Variable | Required | Meaning |
//! |---|---|---|
//! | `IN_STATE` | yes | state file read at startup |
//! | `OUT_STATE` | yes | state file written at the end of the run |
//! | `DRY_RUN` | no | render and log notifications without sending or advancing state |
//! | `CF_API` | yes | platform API base URL |
//! | `CLIENT_ID` / `CLIENT_SECRET` | yes | UAA client credentials |
//! | `INSECURE` | no | skip TLS verification for the platform API |
//! | `SMTP_FROM` | yes | sender address |
//! | `SMTP_HOST` / `SMTP_PORT` | yes | mail server |
//! | `SMTP_USER` / `SMTP_PASSWORD` | yes | mail server credentials |
//! | `SMTP_CERT` | no | PEM CA certificate trusted for the mail server |
//!
//! Boolean variables accept `1/0`, `true/false`, `yes/no`, `on/off`.

use clap::Args;
use clap::builder::BoolishValueParser;
use std::fmt;
use std::path::PathBuf;

/// Where state lives and whether this run may change anything.
#[derive(Debug, Clone, Args)]
pub struct RunConfig {
    /// Path of the state file read at startup
    #[arg(long, env = "IN_STATE")]
    pub in_state: PathBuf,

    /// Path of the state file written at the end of the run
    #[arg(long, env = "OUT_STATE")]
    pub out_state: PathBuf,

    /// Log notifications instead of sending them and leave state unchanged
    #[arg(
        long,
        env = "DRY_RUN",
        action = clap::ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub dry_run: bool,
}

/// Platform API endpoint and client credentials.
#[derive(Clone, Args)]
pub struct CfApiConfig {
    /// Platform API base URL, e.g. https://api.example.com
    #[arg(long = "cf-api", env = "CF_API")]
    pub api: String,

    /// UAA client id
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: String,

    /// UAA client secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Skip TLS certificate verification for the platform API
    #[arg(
        long,
        env = "INSECURE",
        action = clap::ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub insecure: bool,
}

impl fmt::Debug for CfApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CfApiConfig")
            .field("api", &self.api)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("insecure", &self.insecure)
            .finish()
    }
}

/// Outgoing mail settings.
#[derive(Clone, Args)]
pub struct EmailConfig {
    /// Sender address of notification e-mails
    #[arg(long = "smtp-from", env = "SMTP_FROM")]
    pub from: String,

    /// Mail server host
    #[arg(long = "smtp-host", env = "SMTP_HOST")]
    pub host: String,

    /// Mail server port
    #[arg(long = "smtp-port", env = "SMTP_PORT")]
    pub port: u16,

    /// Mail server user
    #[arg(long = "smtp-user", env = "SMTP_USER")]
    pub user: String,

    /// Mail server password
    #[arg(long = "smtp-password", env = "SMTP_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// PEM encoded CA certificate to trust for the mail server
    #[arg(long = "smtp-cert", env = "SMTP_CERT", hide_env_values = true)]
    pub cert: Option<String>,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("from", &self.from)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("cert", &self.cert.as_ref().map(|_| "<pem>"))
            .finish()
    }
}

/// Complete, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub run: RunConfig,
    pub cf_api: CfApiConfig,
    pub email: EmailConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let cf = CfApiConfig {
            api: "https://api.example.com".to_string(),
            client_id: "notify".to_string(),
            client_secret: "hunter2".to_string(),
            insecure: false,
        };
        let email = EmailConfig {
            from: "no-reply@example.com".to_string(),
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "mailer".to_string(),
            password: "hunter3".to_string(),
            cert: Some("-----BEGIN CERTIFICATE-----".to_string()),
        };

        let rendered = format!("{cf:?} {email:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("hunter3"));
        assert!(!rendered.contains("BEGIN CERTIFICATE"));
        assert!(rendered.contains("smtp.example.com"));
    }
}
